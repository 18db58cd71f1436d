//! Commit history navigation
//!
//! Read-only queries over the commit graph: distance to the root, k-th
//! ancestor and the split point used as the merge baseline. Commits are
//! addressed by id and loaded on demand, never linked in memory.

pub mod commit_graph;
