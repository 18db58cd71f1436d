//! Core repository components
//!
//! - `database`: Content-addressed store for blobs and commits
//! - `index`: Staging index layered on the HEAD commit
//! - `refs`: Branch table and HEAD
//! - `repository`: Wires the components together for commands
//! - `workspace`: Working directory file operations

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
