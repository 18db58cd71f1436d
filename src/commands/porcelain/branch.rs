use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::RepositoryError;

impl Repository {
    /// Create a branch at HEAD without switching to it
    pub fn branch(&self, name: &str) -> anyhow::Result<()> {
        self.load()?;

        let branch_name = BranchName::try_parse(name.to_string())?;
        let head_id = self.refs().read_head()?;
        self.refs().create_branch(&branch_name, &head_id)?;
        tracing::info!(branch = %branch_name, oid = %head_id, "created branch");

        Ok(())
    }

    /// Delete a branch pointer; its commits stay in the store
    pub fn rm_branch(&self, name: &str) -> anyhow::Result<()> {
        self.load()?;

        let branch_name = BranchName::try_parse(name.to_string())
            .map_err(|_| RepositoryError::BranchNotFound(name.to_string()))?;
        if !self.refs().branch_exists(&branch_name) {
            return Err(RepositoryError::BranchNotFound(name.to_string()).into());
        }
        if self.refs().is_current_branch(&branch_name)? {
            return Err(RepositoryError::CannotRemoveCurrentBranch(name.to_string()).into());
        }

        let oid = self.refs().delete_branch(&branch_name)?;
        tracing::info!(branch = %branch_name, %oid, "deleted branch");

        Ok(())
    }
}
