//! Typed repository errors
//!
//! Every precondition failure the core can detect is one variant of
//! [`RepositoryError`]. The `Display` text is the message shown to the user.
//! Core functions return `anyhow::Result` and raise these values inside the
//! `anyhow::Error`, so callers recover them with `downcast_ref`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("No object with id {0} exists.")]
    ObjectNotFound(String),

    #[error("Commit {commit} has no ancestor {distance} generations back.")]
    NoSuchAncestor { commit: String, distance: i64 },

    #[error("No negative distance: {0}")]
    InvalidDistance(i64),

    #[error("File does not exist.")]
    FileNotFound(String),

    #[error("File is a directory.")]
    IsDirectory(String),

    #[error("Filename is empty.")]
    EmptyFilename,

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No changes added to the commit.")]
    NothingStaged,

    #[error("No reason to remove the file.")]
    NothingToRemove(String),

    #[error("A branch with that name does not exist.")]
    BranchNotFound(String),

    #[error("A branch with that name already exists.")]
    BranchAlreadyExists(String),

    #[error("Invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("Cannot remove the current branch.")]
    CannotRemoveCurrentBranch(String),

    #[error("Cannot merge a branch with itself.")]
    SelfMerge(String),

    #[error("You have uncommitted changes.")]
    UncommittedChanges,

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedFileConflict(Vec<String>),

    #[error("No commit with that id exists.")]
    NoCommitWithId(String),

    #[error("Commit id prefix {prefix} is ambiguous: {} candidates.", candidates.len())]
    AmbiguousCommitId {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("No need to checkout the current branch.")]
    AlreadyOnBranch(String),

    #[error("File does not exist in that commit.")]
    FileNotInCommit(String),

    #[error("Found no commit with that message.")]
    NoCommitWithMessage(String),

    #[error("A version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("Not in an initialized repository directory.")]
    NotInitialized,
}

impl RepositoryError {
    /// Whether the error aborts the surrounding command.
    ///
    /// `NothingToRemove` is informational: it is reported, but no state was
    /// touched and the process still exits successfully.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RepositoryError::NothingToRemove(_))
    }
}

/// Extract the typed repository error carried by an `anyhow::Error`, if any.
pub fn repository_error(error: &anyhow::Error) -> Option<&RepositoryError> {
    error.downcast_ref::<RepositoryError>()
}
