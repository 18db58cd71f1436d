//! Stage file format
//!
//! The stage (staging index) records pending additions and removals on top
//! of the HEAD commit. It is persisted as `.strata/index`.
//!
//! ## File Format (Version 1)
//!
//! ```text
//! Header (36 bytes):
//!   - Signature: "STGE" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Head commit id (20 bytes)
//!   - Addition count (4 bytes)
//!   - Removal count (4 bytes)
//!
//! Additions (variable length, sorted by name):
//!   - Blob id (20 bytes)
//!   - Name length (2 bytes) followed by the name
//!
//! Removals (variable length, sorted by name):
//!   - Name length (2 bytes) followed by the name
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```
//!
//! All integers are stored in network byte order.

pub mod checksum;
pub mod stage_entry;
pub mod stage_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of the stage header in bytes
pub const HEADER_SIZE: usize = 36;

/// Magic signature identifying stage files
pub const SIGNATURE: &str = "STGE";

/// Stage file format version
pub const VERSION: u32 = 1;
