use crate::areas::repository::Repository;

impl Repository {
    /// Point the current branch at any commit and check it out
    pub fn reset(&self, commit: &str) -> anyhow::Result<()> {
        self.load()?;

        let target_id = self.resolve_commit_id(commit)?;
        let head_commit = self.head_commit()?;
        self.guard_untracked_files(head_commit.snapshot())?;

        self.switch_work_tree(&target_id)?;
        self.refs().update_head(&target_id)?;
        tracing::info!(oid = %target_id, "reset current branch");

        Ok(())
    }
}
