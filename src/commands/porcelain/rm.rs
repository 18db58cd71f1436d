use crate::areas::repository::Repository;

impl Repository {
    /// Unstage a file, or stage the removal of a tracked one
    pub fn rm(&self, file_name: &str) -> anyhow::Result<()> {
        self.load()?;

        let mut stage = self.stage();
        stage.remove(file_name, self.workspace(), self.database())?;
        stage.write_updates()
    }
}
