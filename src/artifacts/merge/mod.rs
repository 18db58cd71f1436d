//! Three-way merge
//!
//! A merge compares, file by file, the snapshots of the current head, the
//! given branch tip and their split point:
//!
//! - `resolution`: the per-file decision table
//! - `conflict`: conflict marker synthesis
//! - `engine`: applies the table over whole snapshots

pub mod conflict;
pub mod engine;
pub mod resolution;
