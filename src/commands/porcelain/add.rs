use crate::areas::repository::Repository;

impl Repository {
    pub fn add(&self, file_name: &str) -> anyhow::Result<()> {
        self.load()?;

        let mut stage = self.stage();
        stage.add(file_name, self.workspace(), self.database())?;
        stage.write_updates()
    }
}
