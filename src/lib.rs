//! strata: a small local version-control engine
//!
//! - `areas`: persistent components (object store, stage, refs, work tree)
//!   and the [`Repository`](areas::repository::Repository) tying them together
//! - `artifacts`: object types, stage format, ancestry and merge algorithms
//! - `commands`: user-facing commands as `impl Repository` blocks
//! - `errors`: typed precondition failures

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
