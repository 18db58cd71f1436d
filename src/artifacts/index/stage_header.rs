use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::anyhow;
use byteorder::{ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct StageHeader {
    pub marker: String,
    pub version: u32,
    pub head: ObjectId,
    pub additions_count: u32,
    pub removals_count: u32,
}

impl StageHeader {
    pub fn for_head(head: ObjectId, additions_count: u32, removals_count: u32) -> Self {
        StageHeader::new(
            String::from(SIGNATURE),
            VERSION,
            head,
            additions_count,
            removals_count,
        )
    }
}

impl Packable for StageHeader {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(self.marker.as_bytes())?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        self.head.write_h40_to(&mut bytes)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.additions_count)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.removals_count)?;

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for StageHeader {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut marker = [0u8; 4];
        reader
            .read_exact(&mut marker)
            .map_err(|_| anyhow!("Invalid stage header size"))?;
        let marker = String::from_utf8(marker.to_vec())
            .map_err(|_| anyhow!("Invalid marker in stage header"))?;

        let version = reader.read_u32::<byteorder::NetworkEndian>()?;
        let head = ObjectId::read_h40_from(&mut reader)?;
        let additions_count = reader.read_u32::<byteorder::NetworkEndian>()?;
        let removals_count = reader.read_u32::<byteorder::NetworkEndian>()?;

        Ok(StageHeader {
            marker,
            version,
            head,
            additions_count,
            removals_count,
        })
    }
}
