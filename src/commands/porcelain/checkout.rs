use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use std::io::Write;

impl Repository {
    /// Restore `file_name` from HEAD, or from the commit named by `commit`
    ///
    /// The stage is left untouched.
    pub fn checkout_file(&self, commit: Option<&str>, file_name: &str) -> anyhow::Result<()> {
        self.load()?;
        Workspace::validate_file_name(file_name)?;

        let commit_id = match commit {
            Some(commit) => self.resolve_commit_id(commit)?,
            None => self.refs().read_head()?,
        };
        let commit = self.database().get_commit(&commit_id)?;
        let blob_id = commit
            .blob_id(file_name)
            .ok_or_else(|| RepositoryError::FileNotInCommit(file_name.to_string()))?;

        let content = self.database().get(blob_id)?;
        self.workspace().write_file(file_name, &content)?;
        tracing::info!(file = file_name, commit = %commit_id, "restored file");

        Ok(())
    }

    /// Switch the work tree, stage and HEAD to another branch
    pub fn checkout_branch(&self, name: &str) -> anyhow::Result<()> {
        self.load()?;

        let branch_name = BranchName::try_parse(name.to_string())
            .map_err(|_| RepositoryError::BranchNotFound(name.to_string()))?;
        let target_id = self.refs().resolve_branch(&branch_name)?;
        if self.refs().is_current_branch(&branch_name)? {
            return Err(RepositoryError::AlreadyOnBranch(name.to_string()).into());
        }

        let head_commit = self.head_commit()?;
        self.guard_untracked_files(head_commit.snapshot())?;

        self.switch_work_tree(&target_id)?;
        self.refs().set_head(&branch_name)?;
        tracing::info!(branch = %branch_name, oid = %target_id, "checked out branch");

        writeln!(self.writer(), "Switched to branch '{branch_name}'")?;

        Ok(())
    }

    /// Materialize `target_id` and rebase an empty stage onto it
    pub(crate) fn switch_work_tree(&self, target_id: &ObjectId) -> anyhow::Result<()> {
        let target = self.database().get_commit(target_id)?;
        self.materialize(&target)?;

        let mut stage = self.stage();
        stage.clear();
        stage.set_head(target_id.clone());
        stage.write_updates()
    }
}
