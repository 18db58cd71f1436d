use crate::artifacts::objects::blob::Blob;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the metadata directory inside the work tree
pub const METADATA_DIR: &str = ".strata";

/// The working directory holding the user's files
///
/// Only plain files directly inside the work tree are tracked; nested
/// directories are never listed.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail with `InvalidFilename` unless `file_name` names a plain entry
    /// directly inside the work tree
    ///
    /// Snapshots are flat and commit bodies are line based, so path
    /// separators, `.`/`..` and control characters are all rejected.
    pub fn validate_file_name(file_name: &str) -> anyhow::Result<()> {
        let is_valid = !matches!(file_name, "." | ".." | METADATA_DIR)
            && !file_name.contains(['/', '\\'])
            && !file_name.chars().any(char::is_control);

        if !is_valid {
            return Err(RepositoryError::InvalidFilename(file_name.to_string()).into());
        }

        Ok(())
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.file_path(file_name).exists()
    }

    pub fn is_dir(&self, file_name: &str) -> bool {
        self.file_path(file_name).is_dir()
    }

    pub fn parse_blob(&self, file_name: &str) -> anyhow::Result<Blob> {
        Ok(Blob::new(self.read_file(file_name)?))
    }

    /// Plain file names in the work tree, sorted
    pub fn list_files(&self) -> anyhow::Result<Vec<String>> {
        let mut files = WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| name != METADATA_DIR)
            .collect::<Vec<_>>();

        files.sort();
        Ok(files)
    }

    pub fn read_file(&self, file_name: &str) -> anyhow::Result<Bytes> {
        let file_path = self.file_path(file_name);

        let content = std::fs::read(&file_path)
            .with_context(|| format!("Failed to read file: {:?}", file_path))?;

        Ok(content.into())
    }

    pub fn write_file(&self, file_name: &str, data: &[u8]) -> anyhow::Result<()> {
        let file_path = self.file_path(file_name);

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .with_context(|| format!("Failed to open file: {:?}", file_name))?;

        file.write_all(data)
            .with_context(|| format!("Failed to write to file: {:?}", file_name))?;

        Ok(())
    }

    /// Delete a working file; missing files and directories are left alone
    pub fn remove_file(&self, file_name: &str) -> anyhow::Result<()> {
        let file_path = self.file_path(file_name);

        if file_path.is_file() {
            std::fs::remove_file(&file_path)
                .with_context(|| format!("Failed to remove file: {:?}", file_name))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::{FileWriteStr, PathChild, PathCreateDir};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn lists_only_top_level_plain_files() {
        let dir = TempDir::new().unwrap();
        dir.child("b.txt").write_str("b").unwrap();
        dir.child("a.txt").write_str("a").unwrap();
        dir.child("nested").child("c.txt").write_str("c").unwrap();
        dir.child(METADATA_DIR).create_dir_all().unwrap();
        let workspace = Workspace::new(dir.path().into());

        assert_eq!(workspace.list_files().unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[rstest]
    #[case("a\nb")]
    #[case("tab\tname")]
    #[case("../outside.txt")]
    #[case("sub/f.txt")]
    #[case("sub\\f.txt")]
    #[case("..")]
    #[case(".")]
    #[case(METADATA_DIR)]
    fn rejects_names_outside_the_flat_work_tree(#[case] file_name: &str) {
        let error = Workspace::validate_file_name(file_name).unwrap_err();

        assert_eq!(
            error.downcast_ref::<RepositoryError>(),
            Some(&RepositoryError::InvalidFilename(file_name.to_string()))
        );
    }

    #[rstest]
    #[case("notes.txt")]
    #[case(".hidden")]
    #[case("with space.md")]
    #[case("..double-dot-prefix")]
    fn accepts_plain_names(#[case] file_name: &str) {
        assert!(Workspace::validate_file_name(file_name).is_ok());
    }

    #[test]
    fn writes_reads_and_removes_files() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path().into());

        workspace.write_file("f.txt", b"one").unwrap();
        workspace.write_file("f.txt", b"two").unwrap();
        assert_eq!(workspace.read_file("f.txt").unwrap().as_ref(), b"two");

        workspace.remove_file("f.txt").unwrap();
        workspace.remove_file("f.txt").unwrap();
        assert!(!workspace.exists("f.txt"));
    }
}
