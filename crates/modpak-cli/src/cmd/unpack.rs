//! Unpack command - extract a container into a directory

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use modpak_core::Container;
use modpak_core::container::{FLAG_DIRECTORY, FLAG_EXECUTABLE};

use crate::ui::Output;

/// Extract every entry of `container` under a destination directory.
///
/// Entry paths were sanitized when the file table was decoded, so a
/// joined path can never escape the destination.
pub fn unpack(container_path: &Path, output: Option<&Path>, quiet: bool) -> Result<()> {
    let out = Output::quiet(quiet);

    let dest: PathBuf = match output {
        Some(p) => p.to_path_buf(),
        None => match container_path.file_stem() {
            Some(stem) => PathBuf::from(stem),
            None => bail!("Cannot derive a destination from {}", container_path.display()),
        },
    };

    let container = Container::open(container_path)
        .with_context(|| format!("Failed to open {}", container_path.display()))?;
    let entries = container.read_file_table()?;

    fs::create_dir_all(&dest)?;
    let mut files = 0usize;
    for entry in &entries {
        let target = dest.join(&entry.path);
        if entry.flags & FLAG_DIRECTORY != 0 {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = container
            .read_entry(entry)
            .with_context(|| format!("Failed to extract {}", entry.path))?;
        fs::write(&target, bytes)?;
        set_executable(&target, entry.flags & FLAG_EXECUTABLE != 0)?;
        files += 1;
    }

    // The metadata document travels in the header, not the file table;
    // materialize it so the tree can be re-packed.
    let meta = container.metadata()?;
    fs::write(
        dest.join(modpak_core::builder::METADATA_FILENAME),
        meta.to_vec()?,
    )?;

    out.success(&format!("Unpacked {files} files to {}", dest.display()));
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path, executable: bool) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if executable {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path, _executable: bool) -> Result<()> {
    Ok(())
}
