use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// History of HEAD along first parents
    pub fn log(&self) -> anyhow::Result<()> {
        self.load()?;

        let mut current = Some(self.refs().read_head()?);
        while let Some(commit_id) = current {
            let commit = self.database().get_commit(&commit_id)?;
            self.display_commit(&commit_id, &commit)?;

            current = commit.parent().cloned();
        }

        Ok(())
    }

    /// Every commit ever made, newest first
    pub fn global_log(&self) -> anyhow::Result<()> {
        self.load()?;

        let mut commits = self.database().list_commits()?;
        commits.sort_by(|(a_id, a), (b_id, b)| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| a_id.cmp(b_id))
        });

        for (commit_id, commit) in &commits {
            self.display_commit(commit_id, commit)?;
        }

        Ok(())
    }

    /// Ids of the commits whose message is exactly `message`
    pub fn find(&self, message: &str) -> anyhow::Result<()> {
        self.load()?;

        let matches = self
            .database()
            .list_commits()?
            .into_iter()
            .filter(|(_, commit)| commit.message() == message)
            .map(|(commit_id, _)| commit_id)
            .collect::<Vec<_>>();

        if matches.is_empty() {
            return Err(RepositoryError::NoCommitWithMessage(message.to_string()).into());
        }

        for commit_id in matches {
            writeln!(self.writer(), "{commit_id}")?;
        }

        Ok(())
    }

    fn display_commit(&self, commit_id: &ObjectId, commit: &Commit) -> anyhow::Result<()> {
        let mut writer = self.writer();

        writeln!(writer, "===")?;
        writeln!(writer, "{}", format!("commit {commit_id}").yellow())?;
        // merged tip first, then the head it was merged into
        if let (Some(parent), Some(merge_parent)) = (commit.parent(), commit.merge_parent()) {
            writeln!(
                writer,
                "Merge: {} {}",
                merge_parent.to_short_oid(),
                parent.to_short_oid()
            )?;
        }
        writeln!(writer, "Date: {}", commit.readable_timestamp())?;
        writeln!(writer, "{}", commit.message())?;
        writeln!(writer)?;

        Ok(())
    }
}
