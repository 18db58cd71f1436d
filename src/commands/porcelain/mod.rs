//! Porcelain commands
//!
//! ## Commands
//!
//! - `init`: Create the `.strata` layout with the root commit
//! - `add` / `rm`: Stage additions and removals
//! - `commit`: Record the stage as a new commit
//! - `log` / `global-log` / `find`: Inspect history
//! - `status`: Show branches, the stage and the work tree
//! - `checkout`: Restore files or switch branches
//! - `branch` / `rm-branch`: Manage branches
//! - `reset`: Move the current branch to any commit
//! - `merge`: Merge another branch into the current one

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
pub mod reset;
pub mod rm;
pub mod status;
