//! Command implementations
//!
//! Every user-facing command is an `impl Repository` block in `porcelain`.
//! Commands check all of their preconditions before the first mutation and
//! write their output to the repository writer.

pub mod porcelain;
