//! On-demand integrity verification.
//!
//! A successful [`Container::open`] proves structural soundness only.
//! Callers that need content guarantees (before first execution of
//! extracted content, or after a download) call these explicitly; full
//! verification is expensive and is not required merely to resolve
//! dependencies.

use std::fs::File;
use std::io::Read;

use tracing::debug;

use crate::container::{CRC_OFFSET, Container};
use crate::error::Result;

const CHUNK: usize = 64 * 1024;

/// Recompute the whole-file CRC32 and compare it to the header's stored
/// value.
///
/// The four bytes holding the stored checksum are treated as zero during
/// recomputation. Returns `Ok(false)` on mismatch; only I/O failures are
/// errors.
///
/// # Errors
///
/// Returns [`crate::PakError::Io`] if the file cannot be read.
pub fn verify_whole(container: &Container) -> Result<bool> {
    let mut file = File::open(container.path())?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; CHUNK];
    let mut pos: usize = 0;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        // Zero out the stored-CRC bytes if they fall in this chunk.
        for i in CRC_OFFSET..CRC_OFFSET + 4 {
            if i >= pos && i < pos + n {
                buf[i - pos] = 0;
            }
        }
        hasher.update(&buf[..n]);
        pos += n;
    }

    let computed = hasher.finalize();
    let stored = container.header().whole_file_crc32;
    if computed != stored {
        debug!(
            path = %container.path().display(),
            stored = format_args!("{stored:#010x}"),
            computed = format_args!("{computed:#010x}"),
            "whole-file checksum mismatch"
        );
    }
    Ok(computed == stored)
}

/// Decompress one entry and compare its per-file CRC32.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns [`crate::PakError::FileNotFound`] for an unknown path, or any
/// decode / I/O error from reading the entry.
pub fn verify_file(container: &Container, path: &str) -> Result<bool> {
    let entries = container.read_file_table()?;
    let entry = entries
        .iter()
        .find(|e| e.path == path)
        .ok_or_else(|| crate::error::PakError::FileNotFound(path.to_string()))?;

    let bytes = container.read_entry(entry)?;
    let computed = crc32fast::hash(&bytes);
    Ok(computed == entry.crc32)
}

/// Compute the whole-file CRC32 of an assembled container image,
/// treating the stored-CRC bytes as zero. Used by the builder before
/// patching the header.
pub fn whole_file_crc(image: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&image[..CRC_OFFSET]);
    hasher.update(&[0u8; 4]);
    hasher.update(&image[CRC_OFFSET + 4..]);
    hasher.finalize()
}
