//! Content-addressed object types
//!
//! The store holds two kinds of immutable objects, both identified by the
//! SHA-1 of their serialized form `<type> <size>\0<content>`:
//!
//! - **Blob**: the raw bytes of one file version
//! - **Commit**: a snapshot (filename -> blob id) with message, timestamp and
//!   parent links

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Number of hex characters shown for abbreviated ids
pub const SHORT_OBJECT_ID_LENGTH: usize = 7;
