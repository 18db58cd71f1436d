//! Commit object
//!
//! Commits are immutable snapshot nodes. Each one records:
//! - The primary parent (absent only for the root commit)
//! - The merge parent (set only on merge commits)
//! - A creation timestamp
//! - The snapshot: every tracked filename mapped to its blob id
//! - A message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! parent <parent-sha>
//! merge <merge-parent-sha>
//! timestamp <unix-millis> <timezone>
//! file <blob-sha> <filename>
//!
//! <commit message>
//! ```
//!
//! Snapshot entries are written in filename order so equal snapshots always
//! serialize, and therefore hash, identically. Because the timestamp is part
//! of the hashed content, two non-root commits only share an id if they were
//! created in the same millisecond with the same parent, snapshot and message.
//! The root commit is pinned to the Unix epoch and is identical across all
//! repositories.

use crate::artifacts::objects::object::{Object, Packable, Unpackable, with_header};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, SubsecRound};
use std::collections::BTreeMap;
use std::io::BufRead;

/// Message of the commit every repository starts from
pub const ROOT_COMMIT_MESSAGE: &str = "initial commit";

/// Mapping of tracked filename to blob id
pub type Snapshot = BTreeMap<String, ObjectId>;

/// Slim representation of a commit
///
/// Contains only the links needed to navigate history.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    /// The commit's object ID
    pub oid: ObjectId,
    /// Primary parent, `None` for the root commit
    pub parent: Option<ObjectId>,
    /// Second lineage of a merge commit
    pub merge_parent: Option<ObjectId>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    parent: Option<ObjectId>,
    merge_parent: Option<ObjectId>,
    timestamp: DateTime<FixedOffset>,
    snapshot: Snapshot,
    message: String,
}

impl Commit {
    /// Create a commit stamped with the current local time
    pub fn new(
        parent: ObjectId,
        merge_parent: Option<ObjectId>,
        snapshot: Snapshot,
        message: String,
    ) -> Self {
        Self::new_with_timestamp(
            Some(parent),
            merge_parent,
            snapshot,
            message,
            chrono::Local::now().fixed_offset(),
        )
    }

    pub fn new_with_timestamp(
        parent: Option<ObjectId>,
        merge_parent: Option<ObjectId>,
        snapshot: Snapshot,
        message: String,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Commit {
            parent,
            merge_parent,
            // only milliseconds are stored
            timestamp: timestamp.trunc_subsecs(3),
            snapshot,
            message,
        }
    }

    /// The parentless commit every repository starts from
    pub fn root() -> Self {
        Self::new_with_timestamp(
            None,
            None,
            Snapshot::new(),
            ROOT_COMMIT_MESSAGE.to_string(),
            DateTime::<chrono::Utc>::UNIX_EPOCH.fixed_offset(),
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn merge_parent(&self) -> Option<&ObjectId> {
        self.merge_parent.as_ref()
    }

    pub fn is_merge(&self) -> bool {
        self.merge_parent.is_some()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Blob id of `file_name` in this snapshot
    pub fn blob_id(&self, file_name: &str) -> Option<&ObjectId> {
        self.snapshot.get(file_name)
    }

    pub fn tracks(&self, file_name: &str) -> bool {
        self.snapshot.contains_key(file_name)
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Thu Jan 1 00:00:00 1970 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn slim(&self) -> anyhow::Result<SlimCommit> {
        Ok(SlimCommit {
            oid: self.object_id()?,
            parent: self.parent.clone(),
            merge_parent: self.merge_parent.clone(),
        })
    }

    fn body(&self) -> String {
        let mut lines = vec![];

        if let Some(parent) = &self.parent {
            lines.push(format!("parent {parent}"));
        }
        if let Some(merge_parent) = &self.merge_parent {
            lines.push(format!("merge {merge_parent}"));
        }
        lines.push(format!(
            "timestamp {} {}",
            self.timestamp.timestamp_millis(),
            self.timestamp.format("%z")
        ));
        for (file_name, blob_id) in &self.snapshot {
            lines.push(format!("file {blob_id} {file_name}"));
        }
        lines.push(String::new());
        lines.push(self.message.clone());

        lines.join("\n")
    }
}

fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    let (millis, timezone) = value
        .split_once(' ')
        .context("Invalid commit object: malformed timestamp")?;
    let millis = millis
        .parse::<i64>()
        .context("Invalid commit object: timestamp is not a number")?;

    let (sign, digits) = match timezone.split_at_checked(1) {
        Some(("+", digits)) => (1, digits),
        Some(("-", digits)) => (-1, digits),
        _ => anyhow::bail!("Invalid commit object: malformed timezone {timezone}"),
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Invalid commit object: malformed timezone {timezone}");
    }
    let hours = digits[..2].parse::<i32>()?;
    let minutes = digits[2..].parse::<i32>()?;
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .context("Invalid commit object: timezone out of range")?;

    let utc = DateTime::from_timestamp_millis(millis)
        .context("Invalid commit object: timestamp out of range")?;

    Ok(utc.with_timezone(&offset))
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(with_header(&self.object_type(), self.body().as_bytes()))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content)?;

        // headers never contain blank lines, the message may
        let (headers, message) = content
            .split_once("\n\n")
            .context("Invalid commit object: missing message separator")?;

        let mut parent = None;
        let mut merge_parent = None;
        let mut timestamp = None;
        let mut snapshot = Snapshot::new();

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .with_context(|| format!("Invalid commit object: malformed line {line:?}"))?;

            match key {
                "parent" => parent = Some(ObjectId::try_parse(value.to_string())?),
                "merge" => merge_parent = Some(ObjectId::try_parse(value.to_string())?),
                "timestamp" => timestamp = Some(parse_timestamp(value)?),
                "file" => {
                    let (blob_id, file_name) = value.split_once(' ').with_context(|| {
                        format!("Invalid commit object: malformed file entry {value:?}")
                    })?;
                    snapshot.insert(
                        file_name.to_string(),
                        ObjectId::try_parse(blob_id.to_string())?,
                    );
                }
                _ => anyhow::bail!("Invalid commit object: unknown header {key}"),
            }
        }

        let timestamp = timestamp.context("Invalid commit object: missing timestamp line")?;

        Ok(Self::new_with_timestamp(
            parent,
            merge_parent,
            snapshot,
            message.to_string(),
            timestamp,
        ))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.body()
    }
}
