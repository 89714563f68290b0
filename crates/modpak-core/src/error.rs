//! Error taxonomy for the container format.
//!
//! Structural failures (`InvalidMagic`, `Malformed`, overlap, bad paths)
//! are fatal to opening a container and never retried. `Truncated` and
//! `UnsupportedVersion` are split out so callers can give actionable
//! guidance (re-download vs upgrade). Checksum comparison reports
//! through `Ok(bool)` in [`crate::integrity`], not through this enum.
//! Resolution and network errors live in their own modules.

use thiserror::Error;

/// Errors produced while reading or writing a container.
#[derive(Error, Debug)]
pub enum PakError {
    /// The magic token did not match.
    #[error("Invalid magic token in header (not a modpak container)")]
    InvalidMagic,

    /// The format version is outside the supported range.
    #[error("Unsupported container format version {version} (supported: {min}..={max})")]
    UnsupportedVersion {
        /// Version the header declares.
        version: u16,
        /// Oldest supported version.
        min: u16,
        /// Newest supported version.
        max: u16,
    },

    /// A declared region extends past the physical end of the file.
    #[error("Truncated container: {region} ends at byte {declared_end} but file is {actual_len} bytes")]
    Truncated {
        /// Name of the offending region.
        region: &'static str,
        /// Declared end offset of the region.
        declared_end: u64,
        /// Actual length of the file on disk.
        actual_len: u64,
    },

    /// Two declared regions overlap.
    #[error("Region overlap: {a} overlaps {b}")]
    RegionOverlap {
        /// First region.
        a: &'static str,
        /// Second region.
        b: &'static str,
    },

    /// The compression-kind field holds an unknown value.
    #[error("Unknown compression kind: {0}")]
    UnknownCompression(u16),

    /// Generic malformed-structure failure.
    #[error("Malformed container: {0}")]
    Malformed(String),

    /// Decompressed data did not match the declared uncompressed size.
    #[error("Decompressed length mismatch: declared {expected}, got {actual}")]
    LengthMismatch {
        /// Length the header or entry declares.
        expected: u64,
        /// Length the codec produced.
        actual: u64,
    },

    /// Decompression itself failed.
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// A file-table path escapes the package root or repeats.
    #[error("Unsafe path in file table: '{0}'")]
    UnsafePath(String),

    /// Two file-table entries share a path.
    #[error("Duplicate path in file table: '{0}'")]
    DuplicatePath(String),

    /// No file-table entry matches the requested path.
    #[error("No such file in container: '{0}'")]
    FileNotFound(String),

    /// The metadata document failed to decode.
    #[error(transparent)]
    Metadata(#[from] modpak_schema::MetadataError),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PakError>;
