//! Data structures and algorithms
//!
//! - `branch`: Branch name validation
//! - `history`: Ancestry queries over the commit graph
//! - `index`: Binary format of the staging index
//! - `merge`: Three-way merge and conflict synthesis
//! - `objects`: Blob and commit objects
//! - `pager`: `Write` adapter over the terminal pager

pub mod branch;
pub mod history;
pub mod index;
pub mod merge;
pub mod objects;
pub mod pager;
