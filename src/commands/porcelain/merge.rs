use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::merge::engine::{MergeEngine, StagedWrite};
use crate::errors::RepositoryError;
use std::io::Write;

impl Repository {
    /// Merge `name` into the current branch
    ///
    /// Fast-forwards when the current head is the split point and does
    /// nothing when the given tip is. Otherwise the three-way result is
    /// written to the work tree, staged and committed with the given tip as
    /// merge parent; conflicts are committed with markers.
    pub fn merge(&self, name: &str) -> anyhow::Result<()> {
        self.load()?;

        let head_id = self.refs().read_head()?;
        let head_commit = self.database().get_commit(&head_id)?;
        self.guard_untracked_files(head_commit.snapshot())?;
        if !self.stage().is_clear() {
            return Err(RepositoryError::UncommittedChanges.into());
        }

        let branch_name = BranchName::try_parse(name.to_string())
            .map_err(|_| RepositoryError::BranchNotFound(name.to_string()))?;
        let given_id = self.refs().resolve_branch(&branch_name)?;
        let current_branch = self.refs().current_branch()?;
        if branch_name == current_branch {
            return Err(RepositoryError::SelfMerge(name.to_string()).into());
        }

        let split_id = self.commit_graph().split_point(&head_id, &given_id)?;

        if split_id == given_id {
            writeln!(
                self.writer(),
                "Given branch is an ancestor of the current branch."
            )?;
            return Ok(());
        }

        if split_id == head_id {
            self.switch_work_tree(&given_id)?;
            self.refs().update_head(&given_id)?;
            tracing::info!(branch = %current_branch, oid = %given_id, "fast-forwarded");

            writeln!(self.writer(), "Current branch fast-forwarded.")?;
            return Ok(());
        }

        let given_commit = self.database().get_commit(&given_id)?;
        let split_commit = self.database().get_commit(&split_id)?;
        let outcome =
            MergeEngine::new(self.database()).merge(&head_commit, &given_commit, &split_commit)?;

        {
            let mut stage = self.stage();
            for write in &outcome.writes {
                match write {
                    StagedWrite::Add { file_name, content } => {
                        self.workspace().write_file(file_name, content)?;
                        stage.add(file_name, self.workspace(), self.database())?;
                    }
                    StagedWrite::Remove { file_name } => {
                        stage.remove(file_name, self.workspace(), self.database())?;
                    }
                }
            }
        }

        if self.stage().is_clear() {
            tracing::info!(branch = %branch_name, "merge left nothing to commit");
            return Ok(());
        }

        let message = format!("Merged {branch_name} into {current_branch}.");
        let commit_id = self.commit_staged(&message, Some(given_id))?;
        tracing::info!(
            oid = %commit_id,
            split = %split_id,
            conflict = outcome.had_conflict,
            "created merge commit"
        );

        if outcome.had_conflict {
            writeln!(self.writer(), "Encountered a merge conflict.")?;
        }

        Ok(())
    }
}
