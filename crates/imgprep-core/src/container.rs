//! Binary container holding a stream of [`FeatureRecord`]s.
//!
//! Layout:
//!
//! 1. **Header** (12 bytes): magic `IPRC`, format version (`u32` LE), flags (`u32` LE, reserved)
//! 2. **Frames**, repeated until end of file: payload length (`u64` LE) followed by
//!    the protobuf-encoded record
//!
//! There is no index; readers scan frames in order.

use crate::error::{PrepError, PrepResult};
use crate::record::FeatureRecord;
use prost::Message;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONTAINER_MAGIC: [u8; 4] = *b"IPRC";
pub const CONTAINER_VERSION: u32 = 1;
const HEADER_LEN: u64 = 12;
const LEN_PREFIX: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContainerHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
}

impl ContainerHeader {
    fn new() -> Self {
        Self { magic: CONTAINER_MAGIC, version: CONTAINER_VERSION, flags: 0 }
    }

    fn to_bytes(self) -> [u8; HEADER_LEN as usize] {
        let mut out = [0u8; HEADER_LEN as usize];
        out[..4].copy_from_slice(&self.magic);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..].copy_from_slice(&self.flags.to_le_bytes());
        out
    }

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; HEADER_LEN as usize];
        reader.read_exact(&mut buf)?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[..4]);
        let mut word = [0u8; 4];
        word.copy_from_slice(&buf[4..8]);
        let version = u32::from_le_bytes(word);
        word.copy_from_slice(&buf[8..]);
        let flags = u32::from_le_bytes(word);

        Ok(Self { magic, version, flags })
    }

    fn validate(&self) -> PrepResult<()> {
        if self.magic != CONTAINER_MAGIC {
            return Err(PrepError::Read(format!("bad container magic: {:?}", self.magic)));
        }
        if self.version != CONTAINER_VERSION {
            return Err(PrepError::Read(format!("unsupported container version: {}", self.version)));
        }
        Ok(())
    }
}

/// Append-only byte storage a container is written to.
pub trait ContainerSink: Write {
    /// Drop everything past `len` and continue writing from there.
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()>;

    /// Make written bytes durable.
    fn sync(&mut self) -> std::io::Result<()> {
        self.flush()
    }
}

impl ContainerSink for File {
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_all()
    }
}

/// Exclusive, append-only writer for one container.
///
/// The sink is closed when the writer is dropped, so early returns never leak
/// the handle. Each frame goes out in a single write; if that write fails the
/// sink is truncated back to the last complete frame.
#[derive(Debug)]
pub struct ContainerWriter<S: ContainerSink = File> {
    path: PathBuf,
    sink: S,
    committed: u64,
    count: u64,
}

impl ContainerWriter<File> {
    /// Create (or truncate) the container file and write its header.
    pub fn open(path: &Path) -> PrepResult<Self> {
        let file = File::create(path).map_err(|source| PrepError::Write { path: path.to_path_buf(), source })?;
        Self::with_sink(path, file)
    }
}

impl<S: ContainerSink> ContainerWriter<S> {
    /// Write the header to an empty sink. `path` names the container in errors.
    pub fn with_sink(path: &Path, mut sink: S) -> PrepResult<Self> {
        sink.write_all(&ContainerHeader::new().to_bytes())
            .map_err(|source| PrepError::Write { path: path.to_path_buf(), source })?;

        Ok(Self { path: path.to_path_buf(), sink, committed: HEADER_LEN, count: 0 })
    }

    pub fn write(&mut self, record: &FeatureRecord) -> PrepResult<()> {
        record.validate()?;

        let payload_len = record.encoded_len();
        let mut frame = Vec::with_capacity(LEN_PREFIX as usize + payload_len);
        frame.extend_from_slice(&(payload_len as u64).to_le_bytes());
        record.encode(&mut frame).map_err(|e| PrepError::InvalidRecord(e.to_string()))?;

        if let Err(source) = self.sink.write_all(&frame) {
            self.rollback();
            return Err(PrepError::Write { path: self.path.clone(), source });
        }

        self.committed += frame.len() as u64;
        self.count += 1;
        Ok(())
    }

    fn rollback(&mut self) {
        if let Err(e) = self.sink.truncate_to(self.committed) {
            warn!(path = %self.path.display(), error = %e, "failed to truncate partial frame");
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Flush to storage and return the number of records written.
    pub fn close(mut self) -> PrepResult<u64> {
        self.sink.sync().map_err(|source| PrepError::Write { path: self.path.clone(), source })?;
        Ok(self.count)
    }
}

/// Sequential reader over a container file.
pub struct ContainerReader {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    file_len: u64,
    done: bool,
}

impl ContainerReader {
    pub fn open(path: &Path) -> PrepResult<Self> {
        let read_err = |e: std::io::Error| PrepError::Read(format!("{}: {}", path.display(), e));

        let file = File::open(path).map_err(read_err)?;
        let file_len = file.metadata().map_err(read_err)?.len();
        let mut reader = BufReader::new(file);
        ContainerHeader::read_from(&mut reader).map_err(read_err)?.validate()?;

        Ok(Self { path: path.to_path_buf(), reader, offset: HEADER_LEN, file_len, done: false })
    }

    /// Read every record in the container.
    pub fn read_all(path: &Path) -> PrepResult<Vec<FeatureRecord>> {
        Self::open(path)?.collect()
    }

    fn truncated(&self) -> PrepError {
        PrepError::Read(format!("{}: truncated frame at offset {}", self.path.display(), self.offset))
    }

    fn next_record(&mut self) -> PrepResult<Option<FeatureRecord>> {
        if self.offset == self.file_len {
            return Ok(None);
        }
        if self.offset + LEN_PREFIX > self.file_len {
            return Err(self.truncated());
        }

        let mut len_bytes = [0u8; LEN_PREFIX as usize];
        self.reader.read_exact(&mut len_bytes)?;
        let payload_len = u64::from_le_bytes(len_bytes);
        if payload_len > self.file_len - self.offset - LEN_PREFIX {
            return Err(self.truncated());
        }

        let mut payload = vec![0u8; payload_len as usize];
        self.reader.read_exact(&mut payload)?;
        let record = FeatureRecord::decode(payload.as_slice())
            .map_err(|e| PrepError::Read(format!("{}: frame at offset {}: {}", self.path.display(), self.offset, e)))?;

        self.offset += LEN_PREFIX + payload_len;
        Ok(Some(record))
    }
}

impl Iterator for ContainerReader {
    type Item = PrepResult<FeatureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_record().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}
