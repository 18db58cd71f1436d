use crate::areas::database::{CommitCache, Database};
use crate::areas::index::Stage;
use crate::areas::refs::Refs;
use crate::areas::workspace::{METADATA_DIR, Workspace};
use crate::artifacts::history::commit_graph::CommitGraph;
use crate::artifacts::objects::commit::{Commit, SlimCommit, Snapshot};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::Path;

/// A work tree together with its `.strata` metadata
///
/// Commands are `impl Repository` blocks: each one loads the state it needs,
/// checks every precondition, then mutates and persists. User-facing output
/// goes to the writer the repository was opened with.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    stage: RefCell<Stage>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    commit_cache: CommitCache,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Failed to create work tree {}", path.display()))?;
        }
        let path = path.canonicalize()?;
        let metadata_path = path.join(METADATA_DIR);

        let stage = Stage::new(
            metadata_path.join("index").into_boxed_path(),
            ObjectId::default(),
        );
        let database = Database::new(metadata_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(metadata_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            stage: RefCell::new(stage),
            database,
            workspace,
            refs,
            commit_cache: CommitCache::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata_path(&self) -> Box<Path> {
        self.path.join(METADATA_DIR).into_boxed_path()
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn stage(&'_ self) -> RefMut<'_, Stage> {
        self.stage.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn is_initialized(&self) -> bool {
        self.metadata_path().is_dir()
    }

    /// Fail with `NotInitialized` unless `.strata` exists, then load the stage
    pub fn load(&self) -> anyhow::Result<()> {
        if !self.is_initialized() {
            return Err(RepositoryError::NotInitialized.into());
        }

        self.stage().rehydrate()
    }

    pub fn head_commit(&self) -> anyhow::Result<Commit> {
        self.database.get_commit(&self.refs.read_head()?)
    }

    /// Ancestry queries backed by the object store
    pub fn commit_graph(
        &self,
    ) -> CommitGraph<impl Fn(&ObjectId) -> anyhow::Result<SlimCommit> + '_> {
        CommitGraph::new(move |oid: &ObjectId| {
            self.commit_cache
                .get_or_load_slim_commit(&self.database, oid)
        })
    }

    /// Resolve a full or abbreviated commit id
    ///
    /// Only commits count as candidates; a prefix shared with blobs alone
    /// still resolves uniquely.
    pub fn resolve_commit_id(&self, id: &str) -> anyhow::Result<ObjectId> {
        if !ObjectId::is_valid_prefix(id) {
            return Err(RepositoryError::NoCommitWithId(id.to_string()).into());
        }

        let mut candidates = Vec::new();
        for oid in self.database.find_objects_by_prefix(id)? {
            if self.database.get_object_type(&oid)? == ObjectType::Commit {
                candidates.push(oid);
            }
        }

        match candidates.len() {
            0 => Err(RepositoryError::NoCommitWithId(id.to_string()).into()),
            1 => Ok(candidates.remove(0)),
            _ => Err(RepositoryError::AmbiguousCommitId {
                prefix: id.to_string(),
                candidates: candidates.iter().map(ToString::to_string).collect(),
            }
            .into()),
        }
    }

    /// Fail with `UntrackedFileConflict` if a working file is neither staged
    /// for addition nor tracked by `head_snapshot`
    pub fn guard_untracked_files(&self, head_snapshot: &Snapshot) -> anyhow::Result<()> {
        let working_files = self.workspace.list_files()?;
        let untracked = self
            .stage()
            .untracked_conflicts(&working_files, head_snapshot);

        if !untracked.is_empty() {
            return Err(RepositoryError::UntrackedFileConflict(untracked).into());
        }

        Ok(())
    }

    /// Make the work tree hold exactly the files of `target`
    ///
    /// Every blob is read before the first file is written.
    pub fn materialize(&self, target: &Commit) -> anyhow::Result<()> {
        let contents = target
            .snapshot()
            .iter()
            .map(|(file_name, blob_id)| Ok((file_name, self.database.get(blob_id)?)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let working_files = self.workspace.list_files()?;

        for (file_name, content) in contents {
            self.workspace.write_file(file_name, &content)?;
        }
        for file_name in working_files {
            if !target.tracks(&file_name) {
                self.workspace.remove_file(&file_name)?;
            }
        }

        Ok(())
    }
}
