//! Package authoring: build a container from a source directory.
//!
//! The source directory holds a `mod.json` metadata document plus the
//! payload tree. The writer preserves every read-path invariant:
//! sanitized relative paths, unique entries, correct per-file and
//! whole-file checksums, and non-overlapping regions. Entries are
//! walked in sorted order so the same input tree always produces the
//! same container.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use modpak_schema::PackageMetadata;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::compression::CompressionKind;
use crate::container::{
    CRC_OFFSET, FLAG_EXECUTABLE, FileTableEntry, HEADER_LEN, PackageHeader, VERSION_MAX,
    validate_entry_path,
};
use crate::error::{PakError, Result};
use crate::integrity::whole_file_crc;

/// Name of the metadata document inside a source directory.
pub const METADATA_FILENAME: &str = "mod.json";

/// Builds a `.mpk` container from a directory tree.
#[derive(Debug)]
pub struct PackageBuilder {
    source: PathBuf,
    compression: CompressionKind,
}

impl PackageBuilder {
    /// Create a builder for the given source directory.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            compression: CompressionKind::default(),
        }
    }

    /// Select the compression kind for metadata and content.
    pub fn compression(mut self, kind: CompressionKind) -> Self {
        self.compression = kind;
        self
    }

    /// Build the container and write it to `out_path`.
    ///
    /// Returns the validated metadata of the built package.
    ///
    /// # Errors
    ///
    /// [`PakError::Metadata`] if `mod.json` is missing or malformed,
    /// [`PakError::UnsafePath`] if a payload path fails sanitation, or
    /// I/O errors reading the tree / writing the output.
    pub fn write_to(&self, out_path: &Path) -> Result<PackageMetadata> {
        let metadata_doc = fs::read(self.source.join(METADATA_FILENAME)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PakError::Malformed(format!(
                    "source directory has no {METADATA_FILENAME}: {}",
                    self.source.display()
                ))
            } else {
                PakError::Io(e)
            }
        })?;
        let metadata = PackageMetadata::from_slice(&metadata_doc)?;

        // Re-encode the validated document so the stored bytes are
        // canonical regardless of the author's formatting.
        let metadata_plain = metadata.to_vec()?;
        let metadata_compressed = self.compression.compress(&metadata_plain)?;

        let mut entries: Vec<FileTableEntry> = Vec::new();
        let mut content: Vec<u8> = Vec::new();

        for source_path in self.collect_files()? {
            let rel = relative_slash_path(&self.source, &source_path)?;
            validate_entry_path(&rel)?;

            let plain = fs::read(&source_path)?;
            let stored = self.compression.compress(&plain)?;
            let file_meta = fs::metadata(&source_path)?;

            entries.push(FileTableEntry {
                path: rel,
                content_offset: content.len() as u32,
                compressed_size: stored.len() as u32,
                uncompressed_size: plain.len() as u32,
                crc32: crc32fast::hash(&plain),
                flags: entry_flags(&file_meta),
                timestamp: file_meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_secs()),
            });
            content.extend_from_slice(&stored);
            debug!(path = %entries[entries.len() - 1].path, "packed entry");
        }

        let mut table = Vec::new();
        for entry in &entries {
            entry.encode(&mut table);
        }

        // Region geometry in u64; the format stores u32 offsets, so the
        // assembled size must fit before any of them is narrowed.
        let metadata_offset = HEADER_LEN as u64;
        let file_table_offset = metadata_offset + metadata_compressed.len() as u64;
        let content_offset = file_table_offset + table.len() as u64;
        let total_file_size = declared_size(content_offset + content.len() as u64)?;

        let header = PackageHeader {
            format_version: VERSION_MAX,
            compression: self.compression,
            metadata_offset: metadata_offset as u32,
            metadata_size_compressed: metadata_compressed.len() as u32,
            metadata_size_uncompressed: metadata_plain.len() as u32,
            file_table_offset: file_table_offset as u32,
            file_table_count: entries.len() as u32,
            content_offset: content_offset as u32,
            total_file_size,
            whole_file_crc32: 0,
            flags: 0,
        };

        let mut image = Vec::with_capacity(total_file_size as usize);
        image.extend_from_slice(&header.to_bytes());
        image.extend_from_slice(&metadata_compressed);
        image.extend_from_slice(&table);
        image.extend_from_slice(&content);

        let crc = whole_file_crc(&image);
        image[CRC_OFFSET..CRC_OFFSET + 4].copy_from_slice(&crc.to_le_bytes());

        fs::write(out_path, &image)?;
        info!(
            out = %out_path.display(),
            mod_id = %metadata.mod_id,
            version = %metadata.version,
            entries = entries.len(),
            bytes = image.len(),
            "container written"
        );
        Ok(metadata)
    }

    /// Payload files in deterministic (sorted) order, excluding the
    /// metadata document itself.
    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let metadata_path = self.source.join(METADATA_FILENAME);
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.source).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                PakError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("walk failed on a non-filesystem entry")
                }))
            })?;
            if entry.file_type().is_file() && entry.path() != metadata_path {
                files.push(entry.path().to_path_buf());
            }
        }
        Ok(files)
    }
}

fn declared_size(total: u64) -> Result<u32> {
    u32::try_from(total).map_err(|_| {
        PakError::Malformed(format!(
            "assembled container is {total} bytes, beyond the format's u32 capacity"
        ))
    })
}

fn relative_slash_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| PakError::UnsafePath(path.display().to_string()))?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .ok_or_else(|| PakError::UnsafePath(path.display().to_string()))
        })
        .collect::<Result<_>>()?;
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn entry_flags(meta: &fs::Metadata) -> u8 {
    use std::os::unix::fs::PermissionsExt;
    if meta.permissions().mode() & 0o111 != 0 {
        FLAG_EXECUTABLE
    } else {
        0
    }
}

#[cfg(not(unix))]
fn entry_flags(_meta: &fs::Metadata) -> u8 {
    0
}
