//! Container reading: header parsing, metadata inflation, file-table
//! decoding, and lazy random access into the content region.
//!
//! Opening a container validates structure only: magic, version, and
//! region geometry. Content integrity is never implied; callers that
//! need it use [`crate::integrity`] explicitly.
//!
//! Every read operation opens its own file handle, so containers can be
//! read from a worker pool and two reads of the same entry are safe to
//! run concurrently.

mod cursor;
mod file_table;
mod header;

pub use cursor::Cursor;
pub use file_table::{FLAG_DIRECTORY, FLAG_EXECUTABLE, FileTableEntry, validate_entry_path};
pub use header::{CRC_OFFSET, HEADER_LEN, MAGIC, PackageHeader, VERSION_MAX, VERSION_MIN};

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use modpak_schema::PackageMetadata;
use tracing::debug;

use crate::error::{PakError, Result};

/// An opened, structurally validated container file.
#[derive(Debug, Clone)]
pub struct Container {
    path: PathBuf,
    header: PackageHeader,
}

impl Container {
    /// Open a container and validate its header.
    ///
    /// Reads exactly the 64-byte header, verifies the magic token, the
    /// supported version range, and that every declared region lies
    /// inside the file's actual byte length. Nothing else is read.
    ///
    /// # Errors
    ///
    /// [`PakError::InvalidMagic`], [`PakError::UnsupportedVersion`],
    /// [`PakError::Truncated`], or another format error; I/O failures
    /// surface as [`PakError::Io`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let physical_len = file.metadata()?.len();

        let mut buf = [0u8; HEADER_LEN];
        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PakError::Truncated {
                    region: "header",
                    declared_end: HEADER_LEN as u64,
                    actual_len: physical_len,
                }
            } else {
                PakError::Io(e)
            }
        })?;

        let header = PackageHeader::from_bytes(&buf)?;
        header.validate(physical_len)?;

        debug!(
            path = %path.display(),
            version = header.format_version,
            compression = %header.compression,
            entries = header.file_table_count,
            "opened container"
        );

        Ok(Self { path, header })
    }

    /// The parsed header.
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    /// Path of the container on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read `len` bytes at `offset` through a fresh file handle.
    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read and inflate the metadata block.
    ///
    /// Reads exactly the declared compressed size and decompresses with
    /// the declared uncompressed size as the expected length; any other
    /// output length is a format error.
    ///
    /// # Errors
    ///
    /// Format or I/O errors as for [`open`](Self::open), plus
    /// [`PakError::LengthMismatch`] / [`PakError::Decompress`].
    pub fn read_metadata(&self) -> Result<Vec<u8>> {
        let compressed = self.read_range(
            u64::from(self.header.metadata_offset),
            self.header.metadata_size_compressed as usize,
        )?;
        self.header
            .compression
            .decompress(&compressed, u64::from(self.header.metadata_size_uncompressed))
    }

    /// Decode the metadata document into its validated model.
    ///
    /// # Errors
    ///
    /// As [`read_metadata`](Self::read_metadata), plus
    /// [`PakError::Metadata`] if the document fails validation.
    pub fn metadata(&self) -> Result<PackageMetadata> {
        let bytes = self.read_metadata()?;
        Ok(PackageMetadata::from_slice(&bytes)?)
    }

    /// Decode the file table.
    ///
    /// Exactly `file_table_count` records are read through a
    /// bounds-checked cursor; paths are sanitized and deduplicated at
    /// decode time, and every entry's byte range is checked against the
    /// content region.
    ///
    /// # Errors
    ///
    /// [`PakError::Malformed`], [`PakError::UnsafePath`],
    /// [`PakError::DuplicatePath`], or I/O errors.
    pub fn read_file_table(&self) -> Result<Vec<FileTableEntry>> {
        let start = u64::from(self.header.file_table_offset);
        let end = self.header.file_table_end();
        let bytes = self.read_range(start, (end - start) as usize)?;
        file_table::decode_table(&bytes, self.header.file_table_count, self.header.content_len())
    }

    /// Open one entry for lazy reading.
    ///
    /// No content bytes are read or decompressed until the returned
    /// reader is consumed, which bounds peak memory for packages with
    /// large media payloads.
    ///
    /// # Errors
    ///
    /// [`PakError::FileNotFound`] if no entry matches `path` exactly,
    /// or any file-table decode error.
    pub fn open_file(&self, path: &str) -> Result<EntryReader> {
        let entries = self.read_file_table()?;
        let entry = entries
            .into_iter()
            .find(|e| e.path == path)
            .ok_or_else(|| PakError::FileNotFound(path.to_string()))?;
        Ok(EntryReader {
            container: self.clone(),
            entry,
            buf: None,
        })
    }

    /// Read and decompress one entry's bytes eagerly.
    ///
    /// # Errors
    ///
    /// Decompression and I/O errors as for
    /// [`read_metadata`](Self::read_metadata).
    pub fn read_entry(&self, entry: &FileTableEntry) -> Result<Vec<u8>> {
        let offset = u64::from(self.header.content_offset) + u64::from(entry.content_offset);
        let stored = self.read_range(offset, entry.compressed_size as usize)?;
        self.header
            .compression
            .decompress(&stored, u64::from(entry.uncompressed_size))
    }
}

/// Lazy byte stream over one content entry.
///
/// Decompression happens on the first `read` call; until then the entry
/// occupies no memory beyond its table record. Dropping the reader
/// without reading costs nothing.
#[derive(Debug)]
pub struct EntryReader {
    container: Container,
    entry: FileTableEntry,
    buf: Option<std::io::Cursor<Vec<u8>>>,
}

impl EntryReader {
    /// The file-table entry this reader serves.
    pub fn entry(&self) -> &FileTableEntry {
        &self.entry
    }
}

impl Read for EntryReader {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let buf = if let Some(buf) = self.buf.as_mut() {
            buf
        } else {
            let bytes = self
                .container
                .read_entry(&self.entry)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            self.buf.insert(std::io::Cursor::new(bytes))
        };
        buf.read(out)
    }
}
