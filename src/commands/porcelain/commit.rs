use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;

impl Repository {
    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        self.load()?;

        let commit_id = self.commit_staged(message, None)?;
        let branch = self.refs().current_branch()?;

        writeln!(
            self.writer(),
            "[{} {}] {}",
            branch,
            commit_id.to_short_oid(),
            message.lines().next().unwrap_or_default()
        )?;

        Ok(())
    }

    /// Build a commit from the stage, advance the current branch and persist
    /// the emptied stage
    pub(crate) fn commit_staged(
        &self,
        message: &str,
        merge_parent: Option<ObjectId>,
    ) -> anyhow::Result<ObjectId> {
        let mut stage = self.stage();
        let commit_id =
            stage.build_commit(message, merge_parent, self.workspace(), self.database())?;

        self.refs().update_head(&commit_id)?;
        stage.write_updates()?;

        Ok(commit_id)
    }
}
