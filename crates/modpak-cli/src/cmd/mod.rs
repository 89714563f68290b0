//! Subcommand implementations.

pub mod check_updates;
pub mod info;
pub mod pack;
pub mod resolve;
pub mod unpack;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use modpak_core::Container;
use modpak_schema::PackageMetadata;

/// Container file extension.
pub const CONTAINER_EXT: &str = "mpk";

/// Open every `.mpk` container in a directory and read its metadata.
///
/// Entries are returned sorted by path so output is stable. Unreadable
/// containers abort with context naming the offending file.
pub fn scan_dir(dir: &Path) -> Result<Vec<(PathBuf, PackageMetadata)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(CONTAINER_EXT))
        .collect();
    paths.sort();

    let mut mods = Vec::with_capacity(paths.len());
    for path in paths {
        let container = Container::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let meta = container
            .metadata()
            .with_context(|| format!("Failed to read metadata from {}", path.display()))?;
        mods.push((path, meta));
    }
    Ok(mods)
}
