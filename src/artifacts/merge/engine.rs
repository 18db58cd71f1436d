//! Whole-snapshot merge
//!
//! The engine classifies every filename in the union of the current, given
//! and split snapshots and turns each decision into a staged write. It only
//! reads blobs: the caller applies the writes to the work tree and stage and
//! creates the merge commit, so every failure happens before anything is
//! touched.

use crate::areas::database::Database;
use crate::artifacts::merge::conflict::synthesize_conflict;
use crate::artifacts::merge::resolution::Resolution;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::{Commit, Snapshot};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::collections::BTreeSet;

/// Change to apply to one working file and stage it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedWrite {
    /// Write `content` to the working file and stage it for addition
    Add { file_name: String, content: Bytes },
    /// Delete the working file and stage it for removal
    Remove { file_name: String },
}

impl StagedWrite {
    pub fn file_name(&self) -> &str {
        match self {
            StagedWrite::Add { file_name, .. } | StagedWrite::Remove { file_name } => file_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Snapshot the merge commit will record
    pub snapshot: Snapshot,
    /// Writes in filename order
    pub writes: Vec<StagedWrite>,
    pub had_conflict: bool,
}

#[derive(Debug)]
pub struct MergeEngine<'d> {
    database: &'d Database,
}

impl<'d> MergeEngine<'d> {
    pub fn new(database: &'d Database) -> Self {
        MergeEngine { database }
    }

    pub fn merge(
        &self,
        current: &Commit,
        given: &Commit,
        split: &Commit,
    ) -> anyhow::Result<MergeOutcome> {
        let file_names = current
            .snapshot()
            .keys()
            .chain(given.snapshot().keys())
            .chain(split.snapshot().keys())
            .collect::<BTreeSet<_>>();

        let mut snapshot = current.snapshot().clone();
        let mut writes = Vec::new();
        let mut had_conflict = false;

        for file_name in file_names {
            let resolution = Resolution::classify(
                current.blob_id(file_name),
                given.blob_id(file_name),
                split.blob_id(file_name),
            );
            tracing::trace!(file = %file_name, ?resolution, "resolved");

            match resolution {
                Resolution::Unchanged | Resolution::KeepCurrent => {}
                Resolution::TakeGiven(blob_id) => {
                    writes.push(StagedWrite::Add {
                        file_name: file_name.clone(),
                        content: self.database.get(&blob_id)?,
                    });
                    snapshot.insert(file_name.clone(), blob_id);
                }
                Resolution::Remove => {
                    writes.push(StagedWrite::Remove {
                        file_name: file_name.clone(),
                    });
                    snapshot.remove(file_name);
                }
                Resolution::Conflict { current, given } => {
                    let current = self.read_side(current.as_ref())?;
                    let given = self.read_side(given.as_ref())?;
                    let content = synthesize_conflict(current.as_deref(), given.as_deref());

                    snapshot.insert(
                        file_name.clone(),
                        Blob::new(content.clone()).object_id()?,
                    );
                    writes.push(StagedWrite::Add {
                        file_name: file_name.clone(),
                        content,
                    });
                    had_conflict = true;
                }
            }
        }

        Ok(MergeOutcome {
            snapshot,
            writes,
            had_conflict,
        })
    }

    fn read_side(&self, blob_id: Option<&ObjectId>) -> anyhow::Result<Option<Bytes>> {
        blob_id.map(|blob_id| self.database.get(blob_id)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Store {
        _dir: TempDir,
        database: Database,
    }

    impl Store {
        fn commit(&self, files: &[(&str, &str)]) -> Commit {
            let snapshot = files
                .iter()
                .map(|(name, content)| {
                    let blob_id = self
                        .database
                        .put(Bytes::copy_from_slice(content.as_bytes()))
                        .unwrap();
                    (name.to_string(), blob_id)
                })
                .collect::<Snapshot>();

            Commit::new_with_timestamp(
                None,
                None,
                snapshot,
                "test".to_string(),
                chrono::Utc::now().fixed_offset(),
            )
        }

        fn merge(&self, current: &Commit, given: &Commit, split: &Commit) -> MergeOutcome {
            MergeEngine::new(&self.database)
                .merge(current, given, split)
                .unwrap()
        }
    }

    fn add(file_name: &str, content: &str) -> StagedWrite {
        StagedWrite::Add {
            file_name: file_name.to_string(),
            content: Bytes::copy_from_slice(content.as_bytes()),
        }
    }

    #[fixture]
    fn store() -> Store {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let database = Database::new(dir.path().join("objects").into_boxed_path());

        Store {
            _dir: dir,
            database,
        }
    }

    #[rstest]
    fn diverged_file_conflicts_while_one_sided_files_merge(store: Store) {
        let split = store.commit(&[("f", "orig")]);
        let current = store.commit(&[("f", "base"), ("g", "only-current")]);
        let given = store.commit(&[("f", "changed"), ("h", "only-given")]);

        let outcome = store.merge(&current, &given, &split);

        assert!(outcome.had_conflict);
        assert_eq!(
            outcome.writes,
            vec![
                add("f", "<<<<<<< HEAD\nbase=======\nchanged>>>>>>>\n"),
                add("h", "only-given"),
            ]
        );
        assert_eq!(
            outcome.snapshot.keys().collect::<Vec<_>>(),
            vec!["f", "g", "h"]
        );
        assert_eq!(outcome.snapshot.get("g"), current.blob_id("g"));
    }

    #[rstest]
    fn file_unchanged_in_current_takes_the_given_version(store: Store) {
        let split = store.commit(&[("f", "base")]);
        let current = store.commit(&[("f", "base"), ("g", "only-current")]);
        let given = store.commit(&[("f", "changed"), ("h", "only-given")]);

        let outcome = store.merge(&current, &given, &split);

        assert!(!outcome.had_conflict);
        assert_eq!(
            outcome.writes,
            vec![add("f", "changed"), add("h", "only-given")]
        );
        assert_eq!(outcome.snapshot.get("f"), given.blob_id("f"));
    }

    #[rstest]
    fn removal_in_given_removes_unmodified_file(store: Store) {
        let split = store.commit(&[("f", "base"), ("keep", "k")]);
        let current = store.commit(&[("f", "base"), ("keep", "k")]);
        let given = store.commit(&[("keep", "k")]);

        let outcome = store.merge(&current, &given, &split);

        assert_eq!(
            outcome.writes,
            vec![StagedWrite::Remove {
                file_name: "f".to_string()
            }]
        );
        assert!(!outcome.snapshot.contains_key("f"));
        assert!(!outcome.had_conflict);
    }

    #[rstest]
    fn removal_against_modification_conflicts(store: Store) {
        let split = store.commit(&[("f", "base\n")]);
        let current = store.commit(&[("f", "edited\n")]);
        let given = store.commit(&[]);

        let outcome = store.merge(&current, &given, &split);

        assert!(outcome.had_conflict);
        assert_eq!(
            outcome.writes,
            vec![add("f", "<<<<<<< HEAD\nedited\n=======\n>>>>>>>\n")]
        );
    }

    #[rstest]
    fn file_removed_on_both_sides_stays_absent(store: Store) {
        let split = store.commit(&[("f", "base"), ("other", "o")]);
        let current = store.commit(&[("other", "o")]);
        let given = store.commit(&[("other", "o")]);

        let outcome = store.merge(&current, &given, &split);

        // a same-named working file is never written or deleted
        assert!(outcome.writes.is_empty());
        assert!(!outcome.snapshot.contains_key("f"));
    }

    #[rstest]
    fn changes_only_in_current_need_no_writes(store: Store) {
        let split = store.commit(&[("f", "base"), ("gone", "g")]);
        let current = store.commit(&[("f", "edited"), ("new", "n")]);
        let given = store.commit(&[("f", "base"), ("gone", "g")]);

        let outcome = store.merge(&current, &given, &split);

        assert!(outcome.writes.is_empty());
        assert_eq!(&outcome.snapshot, current.snapshot());
    }

    #[rstest]
    fn conflict_snapshot_entry_matches_written_content(store: Store) {
        let split = store.commit(&[]);
        let current = store.commit(&[("f", "mine\n")]);
        let given = store.commit(&[("f", "theirs\n")]);

        let outcome = store.merge(&current, &given, &split);

        let StagedWrite::Add { content, .. } = &outcome.writes[0] else {
            panic!("expected a conflict write");
        };
        assert_eq!(
            outcome.snapshot.get("f"),
            Some(&Blob::new(content.clone()).object_id().unwrap())
        );
    }
}
