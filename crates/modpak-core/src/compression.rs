//! Compression kinds for metadata and content regions.
//!
//! The codec is an opaque primitive to the rest of the crate: given
//! compressed bytes plus a declared uncompressed size, it reproduces the
//! original bytes or fails. A result of any other length is an error,
//! never silently accepted.

use std::io::Read;

use crate::error::{PakError, Result};

/// Compression applied to the metadata block and content entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum CompressionKind {
    /// Bytes stored verbatim.
    None = 0,
    /// zlib (RFC 1950) streams via flate2.
    #[default]
    Zlib = 1,
    /// LZ4 block format.
    Lz4 = 2,
}

impl CompressionKind {
    /// Parse the header's compression-kind field.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Zlib),
            2 => Some(Self::Lz4),
            _ => None,
        }
    }

    /// Wire value for the header field.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decompress `data`, expecting exactly `expected_len` output bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PakError::Decompress`] if the codec rejects the input
    /// and [`PakError::LengthMismatch`] if the output length differs from
    /// the declared size.
    pub fn decompress(self, data: &[u8], expected_len: u64) -> Result<Vec<u8>> {
        let out = match self {
            Self::None => data.to_vec(),
            Self::Zlib => {
                let mut out = Vec::with_capacity(expected_len as usize);
                // Cap the read one past the declared size so an
                // overlong stream is detected instead of ballooning.
                let mut decoder =
                    flate2::read::ZlibDecoder::new(data).take(expected_len.saturating_add(1));
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| PakError::Decompress(e.to_string()))?;
                out
            }
            Self::Lz4 => lz4_flex::block::decompress(data, expected_len as usize)
                .map_err(|e| PakError::Decompress(e.to_string()))?,
        };

        if out.len() as u64 != expected_len {
            return Err(PakError::LengthMismatch {
                expected: expected_len,
                actual: out.len() as u64,
            });
        }
        Ok(out)
    }

    /// Compress `data` for storage.
    ///
    /// # Errors
    ///
    /// Returns [`PakError::Io`] if the underlying encoder fails.
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Zlib => {
                use std::io::Write;
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Self::Lz4 => Ok(lz4_flex::block::compress(data)),
        }
    }
}

impl std::fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Lz4 => "lz4",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"the quick brown fox jumps over the lazy dog, repeatedly, \
                            the quick brown fox jumps over the lazy dog";

    #[test]
    fn test_round_trip_all_kinds() {
        for kind in [CompressionKind::None, CompressionKind::Zlib, CompressionKind::Lz4] {
            let compressed = kind.compress(SAMPLE).unwrap();
            let restored = kind.decompress(&compressed, SAMPLE.len() as u64).unwrap();
            assert_eq!(restored, SAMPLE, "kind {kind}");
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let compressed = CompressionKind::Zlib.compress(SAMPLE).unwrap();
        let err = CompressionKind::Zlib
            .decompress(&compressed, SAMPLE.len() as u64 - 1)
            .unwrap_err();
        assert!(matches!(
            err,
            PakError::LengthMismatch { .. } | PakError::Decompress(_)
        ));
    }

    #[test]
    fn test_garbage_input_fails_closed() {
        let garbage = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x11];
        assert!(CompressionKind::Zlib.decompress(&garbage, 128).is_err());
        assert!(CompressionKind::Lz4.decompress(&garbage, 128).is_err());
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(CompressionKind::from_u16(2), Some(CompressionKind::Lz4));
        assert_eq!(CompressionKind::from_u16(3), None);
    }
}
