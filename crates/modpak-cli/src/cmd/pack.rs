//! Pack command - build a container from a source directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use modpak_core::{CompressionKind, PackageBuilder};

use crate::ui::Output;

/// Build a `.mpk` container from `source`.
pub fn pack(
    source: &Path,
    output: Option<&Path>,
    compression: &str,
    quiet: bool,
) -> Result<()> {
    let out = Output::quiet(quiet);

    let kind = match compression {
        "none" => CompressionKind::None,
        "zlib" => CompressionKind::Zlib,
        "lz4" => CompressionKind::Lz4,
        other => bail!("Unknown compression '{other}' (expected none, zlib, or lz4)"),
    };

    if !source.is_dir() {
        bail!("Source is not a directory: {}", source.display());
    }

    // Default output name needs the mod_id, so build into a temp name
    // only when the caller gave us one up front.
    let builder = PackageBuilder::new(source).compression(kind);
    let out_path: PathBuf = match output {
        Some(p) => p.to_path_buf(),
        None => {
            // Peek at mod.json for the default filename.
            let doc = std::fs::read(source.join(modpak_core::builder::METADATA_FILENAME))
                .with_context(|| format!("No mod.json in {}", source.display()))?;
            let meta = modpak_schema::PackageMetadata::from_slice(&doc)?;
            PathBuf::from(format!("{}.{}", meta.mod_id, super::CONTAINER_EXT))
        }
    };

    let meta = builder
        .write_to(&out_path)
        .with_context(|| format!("Failed to build {}", out_path.display()))?;

    let size = std::fs::metadata(&out_path)?.len();
    out.success(&format!(
        "Packed {} {} -> {} ({})",
        meta.mod_id,
        meta.version,
        out_path.display(),
        crate::ui::format_size(size)
    ));
    Ok(())
}
