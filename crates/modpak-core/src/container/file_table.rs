//! File-table entries: variable-length records decoded through the
//! bounds-checked [`Cursor`].
//!
//! Path sanitation is enforced here, at decode time: an entry whose path
//! is absolute, contains a parent-directory segment, or repeats within
//! the table rejects the whole container.

use std::collections::HashSet;

use crate::container::cursor::Cursor;
use crate::error::{PakError, Result};

/// Entry flag bit: the entry is a directory marker.
pub const FLAG_DIRECTORY: u8 = 0b0000_0001;

/// Entry flag bit: the entry should be extracted with the executable bit.
pub const FLAG_EXECUTABLE: u8 = 0b0000_0010;

/// One file inside the content region.
///
/// Wire layout (little-endian):
///
/// ```text
/// path_len            u16
/// path                [u8; path_len]  UTF-8, relative, sanitized
/// content_offset      u32             relative to the content region
/// compressed_size     u32
/// uncompressed_size   u32
/// crc32               u32             over the uncompressed bytes
/// flags               u8
/// timestamp           u64             seconds since the Unix epoch
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTableEntry {
    /// Relative path within the package.
    pub path: String,
    /// Offset of the stored bytes, relative to the content region start.
    pub content_offset: u32,
    /// Stored (possibly compressed) size.
    pub compressed_size: u32,
    /// Size after decompression.
    pub uncompressed_size: u32,
    /// CRC32 over the uncompressed bytes.
    pub crc32: u32,
    /// Directory / executable flags.
    pub flags: u8,
    /// Modification time, seconds since the Unix epoch.
    pub timestamp: u64,
}

impl FileTableEntry {
    /// Whether this entry marks a directory.
    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    /// Whether this entry should carry the executable bit.
    pub fn is_executable(&self) -> bool {
        self.flags & FLAG_EXECUTABLE != 0
    }

    /// Append this entry's wire form to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.path.len() as u16).to_le_bytes());
        out.extend_from_slice(self.path.as_bytes());
        out.extend_from_slice(&self.content_offset.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.push(self.flags);
        out.extend_from_slice(&self.timestamp.to_le_bytes());
    }
}

/// Reject paths that could escape the package root.
///
/// A valid path is non-empty, relative (no leading `/` or `\`), and
/// contains no `..` segment. Enforced at decode time for every entry.
///
/// # Errors
///
/// Returns [`PakError::UnsafePath`] for any violation.
pub fn validate_entry_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PakError::UnsafePath(String::new()));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(PakError::UnsafePath(path.to_string()));
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(PakError::UnsafePath(path.to_string()));
    }
    Ok(())
}

/// Minimum wire size of one entry: an empty path plus the fixed fields.
const MIN_ENTRY_LEN: usize = 27;

/// Decode exactly `count` entries from the table's byte span.
///
/// `content_len` is the length of the content region; every entry's byte
/// range must lie within it. The declared count is checked against the
/// table's byte budget before anything is allocated, so a hostile count
/// cannot drive an oversized allocation.
///
/// # Errors
///
/// [`PakError::Malformed`] for a count the table bytes cannot hold, a
/// record crossing the table end, or an entry range outside the content
/// region; [`PakError::UnsafePath`] / [`PakError::DuplicatePath`] for
/// path violations.
pub fn decode_table(bytes: &[u8], count: u32, content_len: u64) -> Result<Vec<FileTableEntry>> {
    let max_entries = bytes.len() / MIN_ENTRY_LEN;
    if count as usize > max_entries {
        return Err(PakError::Malformed(format!(
            "file table declares {count} entries but its {} bytes hold at most {max_entries}",
            bytes.len()
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let mut entries = Vec::with_capacity(count as usize);
    let mut seen: HashSet<String> = HashSet::with_capacity(count as usize);

    for _ in 0..count {
        let path_len = cursor.read_u16()? as usize;
        let path = cursor.read_str(path_len)?.to_string();
        validate_entry_path(&path)?;
        if !seen.insert(path.clone()) {
            return Err(PakError::DuplicatePath(path));
        }

        let entry = FileTableEntry {
            path,
            content_offset: cursor.read_u32()?,
            compressed_size: cursor.read_u32()?,
            uncompressed_size: cursor.read_u32()?,
            crc32: cursor.read_u32()?,
            flags: cursor.read_u8()?,
            timestamp: cursor.read_u64()?,
        };

        let end = u64::from(entry.content_offset) + u64::from(entry.compressed_size);
        if end > content_len {
            return Err(PakError::Malformed(format!(
                "entry '{}' spans bytes {}..{end} of a {content_len}-byte content region",
                entry.path, entry.content_offset
            )));
        }

        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> FileTableEntry {
        FileTableEntry {
            path: path.to_string(),
            content_offset: 0,
            compressed_size: 10,
            uncompressed_size: 20,
            crc32: 0x1234_5678,
            flags: 0,
            timestamp: 1_700_000_000,
        }
    }

    fn encode_all(entries: &[FileTableEntry]) -> Vec<u8> {
        let mut out = Vec::new();
        for e in entries {
            e.encode(&mut out);
        }
        out
    }

    #[test]
    fn test_round_trip() {
        let entries = vec![entry("assets/a.tex"), entry("scripts/init.lua")];
        let mut second = entries[1].clone();
        second.content_offset = 10;
        let bytes = encode_all(&[entries[0].clone(), second.clone()]);
        let decoded = decode_table(&bytes, 2, 1024).unwrap();
        assert_eq!(decoded[0], entries[0]);
        assert_eq!(decoded[1], second);
    }

    #[test]
    fn test_parent_segment_rejected_everywhere() {
        for bad in ["../escape", "a/../b", "deep/dir/..", "..\\win"] {
            let bytes = encode_all(&[entry(bad)]);
            assert!(
                matches!(decode_table(&bytes, 1, 1024), Err(PakError::UnsafePath(_))),
                "path {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_leading_separator_rejected() {
        for bad in ["/abs", "\\abs"] {
            let bytes = encode_all(&[entry(bad)]);
            assert!(matches!(
                decode_table(&bytes, 1, 1024),
                Err(PakError::UnsafePath(_))
            ));
        }
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let bytes = encode_all(&[entry("same.txt"), entry("same.txt")]);
        assert!(matches!(
            decode_table(&bytes, 2, 1024),
            Err(PakError::DuplicatePath(_))
        ));
    }

    #[test]
    fn test_hostile_count_rejected_before_allocating() {
        // A 2-byte table cannot hold u32::MAX entries; the count must be
        // rejected up front rather than sized into an allocation.
        assert!(matches!(
            decode_table(&[0u8; 2], u32::MAX, 1024),
            Err(PakError::Malformed(_))
        ));
    }

    #[test]
    fn test_count_at_byte_budget_still_decodes() {
        let bytes = encode_all(&[entry("a"), entry("b")]);
        let decoded = decode_table(&bytes, 2, 1024).unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_record_past_table_end_rejected() {
        let mut bytes = encode_all(&[entry("ok.txt")]);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            decode_table(&bytes, 1, 1024),
            Err(PakError::Malformed(_))
        ));
    }

    #[test]
    fn test_entry_outside_content_region_rejected() {
        let mut e = entry("big.bin");
        e.content_offset = 1020;
        e.compressed_size = 10;
        let bytes = encode_all(&[e]);
        assert!(matches!(
            decode_table(&bytes, 1, 1024),
            Err(PakError::Malformed(_))
        ));
    }

    #[test]
    fn test_flags() {
        let mut e = entry("bin/tool");
        e.flags = FLAG_EXECUTABLE;
        assert!(e.is_executable());
        assert!(!e.is_directory());
    }
}
