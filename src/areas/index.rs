//! Staging index
//!
//! The stage holds the changes that will make up the next commit, layered
//! on top of the HEAD commit's snapshot:
//!
//! - `additions`: files whose working content differs from HEAD (or that HEAD
//!   does not track), mapped to the blob id captured when they were staged
//! - `removals`: files tracked by HEAD that the next commit drops
//!
//! A filename is never in both sets at once. Blobs are only persisted when
//! the commit is built, so abandoned additions leave nothing behind in the
//! object store.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::checksum::ChecksumStream;
use crate::artifacts::index::stage_entry::StageEntry;
use crate::artifacts::index::stage_header::StageHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::commit::{Commit, Snapshot};
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use anyhow::{Context, anyhow};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Stage {
    /// Path to the stage file (typically `.strata/index`)
    path: Box<Path>,
    additions: BTreeMap<String, ObjectId>,
    removals: BTreeSet<String>,
    /// Commit the stage is layered on
    head: ObjectId,
    /// Flag indicating if the stage has been modified since loading
    changed: bool,
}

impl Stage {
    pub fn new(path: Box<Path>, head: ObjectId) -> Self {
        Stage {
            path,
            additions: BTreeMap::new(),
            removals: BTreeSet::new(),
            head,
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head(&self) -> &ObjectId {
        &self.head
    }

    pub fn is_clear(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn staged_for_addition(&self) -> &BTreeMap<String, ObjectId> {
        &self.additions
    }

    pub fn staged_for_removal(&self) -> &BTreeSet<String> {
        &self.removals
    }

    /// Drop every pending change
    pub fn clear(&mut self) {
        if !self.is_clear() {
            self.changed = true;
        }
        self.additions.clear();
        self.removals.clear();
    }

    /// Rebase the stage onto another commit
    pub fn set_head(&mut self, head: ObjectId) {
        if self.head != head {
            self.changed = true;
        }
        self.head = head;
    }

    pub fn head_commit(&self, database: &Database) -> anyhow::Result<Commit> {
        database.get_commit(&self.head)
    }

    /// Stage the current content of `file_name`
    ///
    /// Re-staging content identical to HEAD drops any stale addition instead
    /// of recording one.
    pub fn add(
        &mut self,
        file_name: &str,
        workspace: &Workspace,
        database: &Database,
    ) -> anyhow::Result<()> {
        if file_name.trim().is_empty() {
            return Err(RepositoryError::EmptyFilename.into());
        }
        Workspace::validate_file_name(file_name)?;
        if !workspace.exists(file_name) {
            return Err(RepositoryError::FileNotFound(file_name.to_string()).into());
        }
        if workspace.is_dir(file_name) {
            return Err(RepositoryError::IsDirectory(file_name.to_string()).into());
        }

        let blob_id = workspace.parse_blob(file_name)?.object_id()?;
        let head_commit = self.head_commit(database)?;

        if head_commit.blob_id(file_name) == Some(&blob_id) {
            tracing::debug!(file = file_name, "content matches HEAD, unstaging");
            self.additions.remove(file_name);
        } else {
            tracing::debug!(file = file_name, oid = %blob_id, "staged for addition");
            self.additions.insert(file_name.to_string(), blob_id);
        }
        self.removals.remove(file_name);
        self.changed = true;

        Ok(())
    }

    /// Unstage `file_name`, and if HEAD tracks it, stage its removal and
    /// delete the working copy
    pub fn remove(
        &mut self,
        file_name: &str,
        workspace: &Workspace,
        database: &Database,
    ) -> anyhow::Result<()> {
        if file_name.trim().is_empty() {
            return Err(RepositoryError::EmptyFilename.into());
        }
        Workspace::validate_file_name(file_name)?;
        if workspace.is_dir(file_name) {
            return Err(RepositoryError::IsDirectory(file_name.to_string()).into());
        }

        let tracked = self.head_commit(database)?.tracks(file_name);
        let staged = self.additions.contains_key(file_name);
        if !tracked && !staged {
            return Err(RepositoryError::NothingToRemove(file_name.to_string()).into());
        }

        self.additions.remove(file_name);
        if tracked {
            workspace.remove_file(file_name)?;
            self.removals.insert(file_name.to_string());
            tracing::debug!(file = file_name, "staged for removal");
        }
        self.changed = true;

        Ok(())
    }

    /// Build, persist and return the id of a commit on top of HEAD
    ///
    /// Staged files are re-read from the work tree, so content changed after
    /// `add` is what gets committed. On success the stage is empty and its
    /// head is the new commit.
    pub fn build_commit(
        &mut self,
        message: &str,
        merge_parent: Option<ObjectId>,
        workspace: &Workspace,
        database: &Database,
    ) -> anyhow::Result<ObjectId> {
        if message.trim().is_empty() {
            return Err(RepositoryError::EmptyMessage.into());
        }
        if self.is_clear() {
            return Err(RepositoryError::NothingStaged.into());
        }

        // read everything before writing anything
        let mut contents = Vec::with_capacity(self.additions.len());
        for file_name in self.additions.keys() {
            if !workspace.exists(file_name) || workspace.is_dir(file_name) {
                return Err(RepositoryError::FileNotFound(file_name.clone()).into());
            }
            contents.push((file_name.clone(), workspace.read_file(file_name)?));
        }

        let mut snapshot = self.head_commit(database)?.snapshot().clone();
        for (file_name, content) in contents {
            let blob_id = database.put(content)?;
            snapshot.insert(file_name, blob_id);
        }
        for file_name in &self.removals {
            snapshot.remove(file_name);
        }

        let commit = Commit::new(
            self.head.clone(),
            merge_parent,
            snapshot,
            message.to_string(),
        );
        let commit_id = database.put_commit(&commit)?;
        tracing::info!(oid = %commit_id, parent = %self.head, "created commit");

        self.set_head(commit_id.clone());
        self.clear();

        Ok(commit_id)
    }

    /// Working files neither staged for addition nor tracked by HEAD
    ///
    /// Any such file blocks checkout, reset and merge, which could otherwise
    /// overwrite or delete it.
    pub fn untracked_conflicts(
        &self,
        working_files: &[String],
        head_snapshot: &Snapshot,
    ) -> Vec<String> {
        working_files
            .iter()
            .filter(|file_name| {
                !self.additions.contains_key(*file_name) && !head_snapshot.contains_key(*file_name)
            })
            .cloned()
            .collect()
    }

    pub fn has_untracked_conflict(
        &self,
        working_files: &[String],
        head_snapshot: &Snapshot,
    ) -> bool {
        !self.untracked_conflicts(working_files, head_snapshot).is_empty()
    }

    /// Untracked files as reported by `status`
    ///
    /// Unlike [`Stage::untracked_conflicts`], a file staged for removal and
    /// then re-created counts as untracked.
    pub fn untracked_files(&self, working_files: &[String], head_snapshot: &Snapshot) -> Vec<String> {
        working_files
            .iter()
            .filter(|file_name| {
                !self.additions.contains_key(*file_name)
                    && (!head_snapshot.contains_key(*file_name)
                        || self.removals.contains(*file_name))
            })
            .cloned()
            .collect()
    }

    /// Load the stage from disk, verifying its checksum
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the stage file during reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        let mut stage_file = std::fs::OpenOptions::new()
            .read(true)
            .open(self.path())
            .with_context(|| format!("failed to open stage file at {:?}", self.path))?;
        let mut lock = file_guard::lock(&mut stage_file, file_guard::Lock::Shared, 0, 1)?;

        let mut reader = ChecksumStream::new(&mut *lock);
        let header = Self::parse_header(&mut reader)?;

        self.additions.clear();
        self.removals.clear();
        for _ in 0..header.additions_count {
            if let StageEntry::Addition { name, oid } = StageEntry::read_addition(&mut reader)? {
                self.additions.insert(name, oid);
            }
        }
        for _ in 0..header.removals_count {
            let entry = StageEntry::read_removal(&mut reader)?;
            self.removals.insert(entry.name().to_string());
        }
        self.head = header.head;
        self.changed = false;

        reader.verify()
    }

    fn parse_header<S: Read>(reader: &mut ChecksumStream<S>) -> anyhow::Result<StageHeader> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = StageHeader::deserialize(std::io::Cursor::new(header_bytes))?;

        if header.marker != SIGNATURE {
            return Err(anyhow!("Invalid stage file signature"));
        }
        if header.version != VERSION {
            return Err(anyhow!("Unsupported stage file version: {}", header.version));
        }

        Ok(header)
    }

    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let mut stage_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path())
            .with_context(|| format!("failed to open stage file at {:?}", self.path))?;
        let mut lock = file_guard::lock(&mut stage_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = ChecksumStream::new(&mut *lock);

        let header = StageHeader::for_head(
            self.head.clone(),
            self.additions.len() as u32,
            self.removals.len() as u32,
        );
        writer.write(&header.serialize()?)?;

        for entry in self.entries() {
            let entry_bytes: Bytes = entry.serialize()?;
            writer.write(&entry_bytes)?;
        }

        writer.seal()?;
        self.changed = false;

        Ok(())
    }

    /// Additions first, then removals, each in name order
    fn entries(&self) -> impl Iterator<Item = StageEntry> + '_ {
        let additions = self
            .additions
            .iter()
            .map(|(name, oid)| StageEntry::Addition {
                name: name.clone(),
                oid: oid.clone(),
            });
        let removals = self
            .removals
            .iter()
            .map(|name| StageEntry::Removal { name: name.clone() });

        additions.chain(removals)
    }
}
