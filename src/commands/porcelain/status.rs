use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Object;
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;

/// How a working file differs from what the next commit would record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    Modified,
    Deleted,
}

impl std::fmt::Display for Modification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modification::Modified => write!(f, "modified"),
            Modification::Deleted => write!(f, "deleted"),
        }
    }
}

impl Repository {
    pub fn status(&self) -> anyhow::Result<()> {
        self.load()?;

        let current_branch = self.refs().current_branch()?;
        let branches = self.refs().list_branches()?;
        let working_files = self.workspace().list_files()?;
        let head_commit = self.head_commit()?;
        let modifications = self.unstaged_modifications(&working_files)?;

        let stage = self.stage();
        let untracked = stage.untracked_files(&working_files, head_commit.snapshot());
        let mut writer = self.writer();

        writeln!(writer, "=== Branches ===")?;
        for branch in branches {
            if branch == current_branch {
                writeln!(writer, "{}", format!("*{branch}").green())?;
            } else {
                writeln!(writer, "{branch}")?;
            }
        }
        writeln!(writer)?;

        writeln!(writer, "=== Staged Files ===")?;
        for file_name in stage.staged_for_addition().keys() {
            writeln!(writer, "{}", file_name.green())?;
        }
        writeln!(writer)?;

        writeln!(writer, "=== Removed Files ===")?;
        for file_name in stage.staged_for_removal() {
            writeln!(writer, "{}", file_name.red())?;
        }
        writeln!(writer)?;

        writeln!(writer, "=== Modifications Not Staged For Commit ===")?;
        for (file_name, modification) in modifications {
            writeln!(writer, "{}", format!("{file_name} ({modification})").red())?;
        }
        writeln!(writer)?;

        writeln!(writer, "=== Untracked Files ===")?;
        for file_name in untracked {
            writeln!(writer, "{}", file_name.red())?;
        }
        writeln!(writer)?;

        Ok(())
    }

    /// Working files whose content differs from the staged or committed
    /// version without that change being staged
    pub fn unstaged_modifications(
        &self,
        working_files: &[String],
    ) -> anyhow::Result<BTreeMap<String, Modification>> {
        let head_commit = self.head_commit()?;
        let stage = self.stage();
        let mut modifications = BTreeMap::new();

        let expected = head_commit
            .snapshot()
            .iter()
            .filter(|(file_name, _)| !stage.staged_for_removal().contains(*file_name))
            .chain(stage.staged_for_addition())
            .collect::<BTreeMap<_, _>>();

        for (file_name, expected_id) in expected {
            if !working_files.contains(file_name) {
                modifications.insert(file_name.clone(), Modification::Deleted);
                continue;
            }

            let working_id = self.workspace().parse_blob(file_name)?.object_id()?;
            if &working_id != expected_id {
                modifications.insert(file_name.clone(), Modification::Modified);
            }
        }

        Ok(modifications)
    }
}
