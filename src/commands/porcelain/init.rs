use crate::areas::repository::Repository;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Commit;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::fs;
use std::io::Write;

impl Repository {
    pub fn init(&self) -> anyhow::Result<()> {
        if self.is_initialized() {
            return Err(RepositoryError::AlreadyInitialized.into());
        }

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .strata/objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .strata/refs/heads directory")?;

        let root_id = self.database().put_commit(&Commit::root())?;
        let default_branch = BranchName::try_parse(DEFAULT_BRANCH.to_string())?;
        self.refs().update_branch(&default_branch, &root_id)?;
        self.refs()
            .set_head(&default_branch)
            .context("Failed to create initial HEAD reference")?;

        let mut stage = self.stage();
        stage.set_head(root_id.clone());
        stage.write_updates()?;

        tracing::info!(root = %root_id, path = %self.path().display(), "initialized repository");
        writeln!(
            self.writer(),
            "Initialized empty strata repository in {}",
            self.metadata_path().display()
        )?;

        Ok(())
    }
}
