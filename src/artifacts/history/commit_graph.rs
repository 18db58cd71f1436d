//! Ancestry queries over first-parent chains
//!
//! Only the primary `parent` link is followed when measuring distances or
//! walking back `k` generations. The merge parent is consulted in exactly one
//! place: the first phase of [`CommitGraph::split_point`].
//!
//! ## Split point
//!
//! The split point is an approximate merge base found in two phases:
//!
//! ### Phase 1: Merge-aware shortcut
//!
//! Walk the first-parent chain of `a` (starting at `a`). Whenever a commit
//! carries a merge parent, walk the first-parent chain of `b` (starting at
//! the parent of `b`, never `b` itself) looking for it. The first hit is
//! returned. This covers the common case where one branch already merged the
//! other and both moved on since.
//!
//! ### Phase 2: Distance-equalized convergence
//!
//! Move whichever commit is farther from the root back along its first
//! parents until both are equidistant, then step both back in lockstep until
//! they meet.
//!
//! Histories with several interleaved merges can yield a split point that is
//! a common ancestor but not the nearest one. Merge resolutions are defined
//! relative to this split point, so that is kept as is.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache = CommitCache::new();
//! let graph = CommitGraph::new(|oid| cache.get_or_load_slim_commit(&database, oid));
//!
//! let split = graph.split_point(&current_head, &given_tip)?;
//! ```

use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;

/// Ancestry queries backed by a commit loader
///
/// # Type Parameters
///
/// * `CommitLoaderFn` - Loads the slim view of a commit by id. The store
///   backed loader memoizes through a `CommitCache`; tests use an in-memory
///   graph.
#[derive(Debug, Clone)]
pub struct CommitGraph<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    commit_loader: CommitLoaderFn,
}

impl<CommitLoaderFn> CommitGraph<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self { commit_loader }
    }

    fn load(&self, oid: &ObjectId) -> anyhow::Result<SlimCommit> {
        (self.commit_loader)(oid)
    }

    /// Number of first-parent steps from `oid` to the root commit
    pub fn distance_to_root(&self, oid: &ObjectId) -> anyhow::Result<i64> {
        let mut distance = 0;
        let mut commit = self.load(oid)?;

        while let Some(parent) = commit.parent {
            commit = self.load(&parent)?;
            distance += 1;
        }

        Ok(distance)
    }

    /// Commit reached by following the first parent exactly `k` times
    pub fn kth_ancestor(&self, oid: &ObjectId, k: i64) -> anyhow::Result<ObjectId> {
        if k < 0 {
            return Err(RepositoryError::InvalidDistance(k).into());
        }

        let mut current = oid.clone();
        for _ in 0..k {
            current = self
                .load(&current)?
                .parent
                .ok_or_else(|| RepositoryError::NoSuchAncestor {
                    commit: oid.to_string(),
                    distance: k,
                })?;
        }

        Ok(current)
    }

    pub fn split_point(&self, a: &ObjectId, b: &ObjectId) -> anyhow::Result<ObjectId> {
        if let Some(split) = self.merged_split_point(a, b)? {
            tracing::debug!(%a, %b, %split, "split point found through merge parent");
            return Ok(split);
        }

        let split = self.converging_split_point(a, b)?;
        tracing::debug!(%a, %b, %split, "split point found by convergence");

        Ok(split)
    }

    /// Phase 1: a merge parent recorded on `a`'s chain that is a proper
    /// first-parent ancestor of `b`
    fn merged_split_point(&self, a: &ObjectId, b: &ObjectId) -> anyhow::Result<Option<ObjectId>> {
        let Some(b_parent) = self.load(b)?.parent else {
            return Ok(None);
        };
        let mut a_commit = Some(self.load(a)?);

        while let Some(commit) = a_commit {
            if let Some(merge_parent) = &commit.merge_parent
                && self.first_parent_chain_contains(&b_parent, merge_parent)?
            {
                return Ok(Some(merge_parent.clone()));
            }

            a_commit = match &commit.parent {
                Some(parent) => Some(self.load(parent)?),
                None => None,
            };
        }

        Ok(None)
    }

    fn first_parent_chain_contains(
        &self,
        start: &ObjectId,
        target: &ObjectId,
    ) -> anyhow::Result<bool> {
        let mut current = Some(start.clone());

        while let Some(oid) = current {
            if &oid == target {
                return Ok(true);
            }
            current = self.load(&oid)?.parent;
        }

        Ok(false)
    }

    /// Phase 2: equalize distances, then step back in lockstep
    fn converging_split_point(&self, a: &ObjectId, b: &ObjectId) -> anyhow::Result<ObjectId> {
        let a_distance = self.distance_to_root(a)?;
        let b_distance = self.distance_to_root(b)?;

        let (mut a, mut b) = if a_distance > b_distance {
            (self.kth_ancestor(a, a_distance - b_distance)?, b.clone())
        } else {
            (a.clone(), self.kth_ancestor(b, b_distance - a_distance)?)
        };

        while a != b {
            let a_parent = self.load(&a)?.parent;
            let b_parent = self.load(&b)?.parent;

            match (a_parent, b_parent) {
                (Some(a_parent), Some(b_parent)) => {
                    a = a_parent;
                    b = b_parent;
                }
                _ => anyhow::bail!("commits {a} and {b} share no ancestor"),
            }
        }

        Ok(a)
    }
}
