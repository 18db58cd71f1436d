//! Stage entries
//!
//! An addition pairs a filename with the blob id captured when it was
//! staged; a removal carries only the filename.

use crate::artifacts::index::checksum::ChecksumStream;
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::anyhow;
use byteorder::WriteBytesExt;
use bytes::Bytes;
use std::io::{Read, Write};

/// Longest filename an entry can carry
const MAX_NAME_SIZE: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEntry {
    Addition { name: String, oid: ObjectId },
    Removal { name: String },
}

impl StageEntry {
    pub fn name(&self) -> &str {
        match self {
            StageEntry::Addition { name, .. } | StageEntry::Removal { name } => name,
        }
    }

    pub(crate) fn read_addition<S: Read>(reader: &mut ChecksumStream<S>) -> anyhow::Result<Self> {
        let oid = reader.read_oid()?;
        let name = reader.read_name()?;

        Ok(StageEntry::Addition { name, oid })
    }

    pub(crate) fn read_removal<S: Read>(reader: &mut ChecksumStream<S>) -> anyhow::Result<Self> {
        Ok(StageEntry::Removal {
            name: reader.read_name()?,
        })
    }
}

impl Packable for StageEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let name = self.name().as_bytes();
        if name.len() > MAX_NAME_SIZE {
            return Err(anyhow!("Filename too long to stage: {}", self.name()));
        }

        let mut bytes = Vec::new();
        if let StageEntry::Addition { oid, .. } = self {
            oid.write_h40_to(&mut bytes)?;
        }
        bytes.write_u16::<byteorder::NetworkEndian>(name.len() as u16)?;
        bytes.write_all(name)?;

        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn addition_carries_binary_oid_and_prefixed_name() {
        let entry = StageEntry::Addition {
            name: "a.txt".to_string(),
            oid: ObjectId::try_parse("0f".repeat(20)).unwrap(),
        };

        let bytes = entry.serialize().unwrap();

        assert_eq!(bytes.len(), 20 + 2 + 5);
        assert_eq!(&bytes[..2], &[0x0f, 0x0f]);
        assert_eq!(&bytes[20..22], &[0, 5]);
        assert_eq!(&bytes[22..], b"a.txt");
    }

    #[test]
    fn removal_is_only_the_name() {
        let entry = StageEntry::Removal {
            name: "gone.txt".to_string(),
        };

        assert_eq!(entry.serialize().unwrap().as_ref(), b"\x00\x08gone.txt");
    }
}
