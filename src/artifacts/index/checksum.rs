//! Checksummed stage stream
//!
//! Wraps the locked stage file (or any byte stream) and folds every byte
//! read or written into a running SHA-1. Writers seal the stream by
//! appending the digest; readers check the trailing digest against what
//! they consumed and refuse anything left after it.

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::{Context, anyhow};
use byteorder::ByteOrder;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

#[derive(Debug)]
pub(crate) struct ChecksumStream<S> {
    stream: S,
    digest: Sha1,
}

impl<S> ChecksumStream<S> {
    pub(crate) fn new(stream: S) -> Self {
        ChecksumStream {
            stream,
            digest: Sha1::new(),
        }
    }
}

impl<S: Read> ChecksumStream<S> {
    pub(crate) fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.stream
            .read_exact(&mut buffer)
            .map_err(|_| anyhow!("Unexpected end-of-file while reading stage"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    /// Binary (20-byte) object id
    pub(crate) fn read_oid(&mut self) -> anyhow::Result<ObjectId> {
        let bytes = self.read(OBJECT_ID_LENGTH / 2)?;
        ObjectId::read_h40_from(&mut bytes.as_ref())
    }

    /// Filename behind a two-byte length prefix
    pub(crate) fn read_name(&mut self) -> anyhow::Result<String> {
        let length = byteorder::NetworkEndian::read_u16(&self.read(2)?);
        let name = self.read(length as usize)?;

        String::from_utf8(name.to_vec()).context("Invalid filename in stage entry")
    }

    /// Consume the trailer and compare it with the digest of everything read
    pub(crate) fn verify(mut self) -> anyhow::Result<()> {
        let mut stored = [0u8; CHECKSUM_SIZE];
        self.stream
            .read_exact(&mut stored)
            .map_err(|_| anyhow!("Stage file is missing its checksum"))?;

        if stored != self.digest.finalize().as_slice() {
            return Err(anyhow!("Stage checksum does not match value stored on disk"));
        }
        if self.stream.read(&mut [0u8; 1])? != 0 {
            return Err(anyhow!("Unexpected data after stage checksum"));
        }

        Ok(())
    }
}

impl<S: Write> ChecksumStream<S> {
    pub(crate) fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the digest of everything written and flush
    pub(crate) fn seal(mut self) -> anyhow::Result<()> {
        let digest = self.digest.finalize();
        self.stream
            .write_all(digest.as_slice())
            .and_then(|()| self.stream.flush())
            .map_err(|_| anyhow!("Failed to write checksum to stage file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sealed(chunks: &[&[u8]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = ChecksumStream::new(&mut bytes);
        for chunk in chunks {
            writer.write(chunk).unwrap();
        }
        writer.seal().unwrap();
        bytes
    }

    #[test]
    fn sealed_stream_reads_back_and_verifies() {
        let oid = ObjectId::try_parse("ab".repeat(20)).unwrap();
        let mut oid_bytes = Vec::new();
        oid.write_h40_to(&mut oid_bytes).unwrap();
        let bytes = sealed(&[&oid_bytes, b"\x00\x05a.txt"]);

        assert_eq!(bytes.len(), 20 + 7 + CHECKSUM_SIZE);

        let mut reader = ChecksumStream::new(Cursor::new(bytes));
        assert_eq!(reader.read_oid().unwrap(), oid);
        assert_eq!(reader.read_name().unwrap(), "a.txt");
        assert!(reader.verify().is_ok());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let mut bytes = sealed(&[b"\x00\x05a.txt"]);
        bytes[2] = b'b';

        let mut reader = ChecksumStream::new(Cursor::new(bytes));
        assert_eq!(reader.read_name().unwrap(), "b.txt");
        assert!(reader.verify().is_err());
    }

    #[test]
    fn trailing_bytes_after_the_checksum_are_rejected() {
        let mut bytes = sealed(&[b"\x00\x01x"]);
        bytes.push(0);

        let mut reader = ChecksumStream::new(Cursor::new(bytes));
        reader.read_name().unwrap();
        assert!(reader.verify().is_err());
    }

    #[test]
    fn truncated_stream_fails_to_read() {
        let mut reader = ChecksumStream::new(Cursor::new(b"\x00\x09short".to_vec()));

        assert!(reader.read_name().is_err());
    }
}
