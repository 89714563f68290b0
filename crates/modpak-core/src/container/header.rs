//! The fixed 64-byte container header.

use crate::compression::CompressionKind;
use crate::container::cursor::Cursor;
use crate::error::{PakError, Result};

/// Magic token at offset 0 of every container.
pub const MAGIC: [u8; 8] = *b"MODPAK\x00\x01";

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 64;

/// Byte offset of the whole-file CRC32 inside the header. These four
/// bytes are treated as zero when the whole-file checksum is computed.
pub const CRC_OFFSET: usize = 40;

/// Oldest format version this reader understands.
pub const VERSION_MIN: u16 = 1;

/// Newest format version this reader understands.
pub const VERSION_MAX: u16 = 1;

/// Fixed 64-byte header record, little-endian throughout.
///
/// Layout:
///
/// ```text
/// 0   magic                      [u8; 8]
/// 8   format_version             u16
/// 10  compression                u16
/// 12  metadata_offset            u32
/// 16  metadata_size_compressed   u32
/// 20  metadata_size_uncompressed u32
/// 24  file_table_offset          u32
/// 28  file_table_count           u32
/// 32  content_offset             u32
/// 36  total_file_size            u32
/// 40  whole_file_crc32           u32
/// 44  flags                      u32
/// 48  reserved                   [u8; 16]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PackageHeader {
    /// Format version of the container.
    pub format_version: u16,
    /// Compression kind for metadata and content.
    pub compression: CompressionKind,
    /// Absolute offset of the compressed metadata block.
    pub metadata_offset: u32,
    /// Stored (compressed) size of the metadata block.
    pub metadata_size_compressed: u32,
    /// Declared uncompressed size of the metadata block.
    pub metadata_size_uncompressed: u32,
    /// Absolute offset of the file table.
    pub file_table_offset: u32,
    /// Number of file-table entries.
    pub file_table_count: u32,
    /// Absolute offset of the content region. The region extends to
    /// `total_file_size`.
    pub content_offset: u32,
    /// Declared total size of the container file.
    pub total_file_size: u32,
    /// CRC32 over the whole file with these four bytes zeroed.
    pub whole_file_crc32: u32,
    /// Reserved flags field.
    pub flags: u32,
}

impl PackageHeader {
    /// Decode a header from exactly [`HEADER_LEN`] bytes.
    ///
    /// Checks the magic token, version range, and compression kind; the
    /// region geometry is checked separately by [`validate`](Self::validate)
    /// once the physical file length is known.
    ///
    /// # Errors
    ///
    /// [`PakError::InvalidMagic`], [`PakError::UnsupportedVersion`],
    /// [`PakError::UnknownCompression`], or [`PakError::Malformed`] for a
    /// short buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(PakError::Malformed(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let mut c = Cursor::new(bytes);
        let magic = c.read_bytes(8)?;
        if magic != MAGIC {
            return Err(PakError::InvalidMagic);
        }

        let format_version = c.read_u16()?;
        if !(VERSION_MIN..=VERSION_MAX).contains(&format_version) {
            return Err(PakError::UnsupportedVersion {
                version: format_version,
                min: VERSION_MIN,
                max: VERSION_MAX,
            });
        }

        let compression_raw = c.read_u16()?;
        let compression = CompressionKind::from_u16(compression_raw)
            .ok_or(PakError::UnknownCompression(compression_raw))?;

        Ok(Self {
            format_version,
            compression,
            metadata_offset: c.read_u32()?,
            metadata_size_compressed: c.read_u32()?,
            metadata_size_uncompressed: c.read_u32()?,
            file_table_offset: c.read_u32()?,
            file_table_count: c.read_u32()?,
            content_offset: c.read_u32()?,
            total_file_size: c.read_u32()?,
            whole_file_crc32: c.read_u32()?,
            flags: c.read_u32()?,
        })
    }

    /// Serialize the header to its fixed 64-byte form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..8].copy_from_slice(&MAGIC);
        out[8..10].copy_from_slice(&self.format_version.to_le_bytes());
        out[10..12].copy_from_slice(&self.compression.as_u16().to_le_bytes());
        out[12..16].copy_from_slice(&self.metadata_offset.to_le_bytes());
        out[16..20].copy_from_slice(&self.metadata_size_compressed.to_le_bytes());
        out[20..24].copy_from_slice(&self.metadata_size_uncompressed.to_le_bytes());
        out[24..28].copy_from_slice(&self.file_table_offset.to_le_bytes());
        out[28..32].copy_from_slice(&self.file_table_count.to_le_bytes());
        out[32..36].copy_from_slice(&self.content_offset.to_le_bytes());
        out[36..40].copy_from_slice(&self.total_file_size.to_le_bytes());
        out[40..44].copy_from_slice(&self.whole_file_crc32.to_le_bytes());
        out[44..48].copy_from_slice(&self.flags.to_le_bytes());
        // bytes 48..64 reserved, zero
        out
    }

    /// End of the metadata region.
    pub fn metadata_end(&self) -> u64 {
        u64::from(self.metadata_offset) + u64::from(self.metadata_size_compressed)
    }

    /// Exclusive upper bound of the file table.
    ///
    /// The header carries no explicit table length, so the table is
    /// bounded by the nearest region that starts at or after it (or the
    /// declared end of the file). Any record that would cross this bound
    /// fails decoding.
    pub fn file_table_end(&self) -> u64 {
        let start = u64::from(self.file_table_offset);
        let mut end = u64::from(self.total_file_size);
        for candidate in [u64::from(self.metadata_offset), u64::from(self.content_offset)] {
            if candidate >= start && candidate < end {
                end = candidate;
            }
        }
        end
    }

    /// Length of the content region.
    pub fn content_len(&self) -> u64 {
        u64::from(self.total_file_size).saturating_sub(u64::from(self.content_offset))
    }

    /// Validate region geometry against the physical file length.
    ///
    /// Truncation (any declared region past the physical end) is reported
    /// as [`PakError::Truncated`]; overlaps and out-of-order regions as
    /// [`PakError::RegionOverlap`] or [`PakError::Malformed`]. The
    /// container is rejected before any further parsing.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn validate(&self, physical_len: u64) -> Result<()> {
        let total = u64::from(self.total_file_size);
        let header_end = HEADER_LEN as u64;

        if total > physical_len {
            return Err(PakError::Truncated {
                region: "container",
                declared_end: total,
                actual_len: physical_len,
            });
        }
        if total < header_end {
            return Err(PakError::Malformed(format!(
                "declared total size {total} is smaller than the header"
            )));
        }

        let metadata_start = u64::from(self.metadata_offset);
        let metadata_end = self.metadata_end();
        let table_start = u64::from(self.file_table_offset);
        let content_start = u64::from(self.content_offset);

        for (region, end) in [
            ("metadata region", metadata_end),
            ("file table", table_start),
            ("content region", content_start),
        ] {
            if end > physical_len {
                return Err(PakError::Truncated {
                    region,
                    declared_end: end,
                    actual_len: physical_len,
                });
            }
        }

        // Regions live between the header and the declared end.
        if metadata_start < header_end || table_start < header_end || content_start < header_end {
            return Err(PakError::Malformed(
                "a region offset points inside the header".to_string(),
            ));
        }
        if metadata_end > total || table_start > total || content_start > total {
            return Err(PakError::Truncated {
                region: "container",
                declared_end: total.max(metadata_end),
                actual_len: physical_len,
            });
        }

        // The content region runs to the end of the file, so metadata and
        // file table must sit entirely before it.
        if metadata_end > content_start && self.metadata_size_compressed > 0 {
            return Err(PakError::RegionOverlap {
                a: "metadata region",
                b: "content region",
            });
        }
        if table_start >= content_start && self.file_table_count > 0 {
            return Err(PakError::RegionOverlap {
                a: "file table",
                b: "content region",
            });
        }
        // Table must not start inside the metadata block.
        if table_start >= metadata_start && table_start < metadata_end {
            return Err(PakError::RegionOverlap {
                a: "file table",
                b: "metadata region",
            });
        }
        // Metadata must not start inside the table's span.
        if metadata_start >= table_start && metadata_start < self.file_table_end() {
            return Err(PakError::RegionOverlap {
                a: "metadata region",
                b: "file table",
            });
        }

        Ok(())
    }
}
