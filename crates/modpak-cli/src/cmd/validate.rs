//! Validate command - verify container checksums

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use modpak_core::{Container, integrity};

use crate::ui::Output;

/// Verify each container fully: the metadata document must decode, and
/// the whole-file checksum and every per-file checksum must match. All
/// problems are reported before the command fails, so one corrupt
/// container never hides another.
pub fn validate(containers: &[PathBuf]) -> Result<()> {
    let output = Output::new();
    let mut failures = 0usize;

    for path in containers {
        failures += validate_one(&output, path);
    }

    if failures > 0 {
        bail!("{failures} validation failure(s)");
    }
    output.success(&format!("{} container(s) verified", containers.len()));
    Ok(())
}

fn validate_one(output: &Output, path: &Path) -> usize {
    let container = match Container::open(path) {
        Ok(c) => c,
        Err(e) => {
            output.error(&format!("{}: {e}", path.display()));
            return 1;
        }
    };

    let mut failures = 0usize;

    // Checksums cannot vouch for the document: a re-checksummed container
    // with mangled metadata must still fail here.
    if let Err(e) = container.metadata() {
        output.error(&format!("{}: metadata: {e}", path.display()));
        failures += 1;
    }

    match integrity::verify_whole(&container) {
        Ok(true) => {}
        Ok(false) => {
            output.error(&format!("{}: whole-file checksum mismatch", path.display()));
            failures += 1;
        }
        Err(e) => {
            output.error(&format!("{}: {e}", path.display()));
            failures += 1;
        }
    }

    let entries = match container.read_file_table() {
        Ok(entries) => entries,
        Err(e) => {
            output.error(&format!("{}: {e}", path.display()));
            return failures + 1;
        }
    };

    for entry in &entries {
        match integrity::verify_file(&container, &entry.path) {
            Ok(true) => {}
            Ok(false) => {
                output.error(&format!(
                    "{}: checksum mismatch in {}",
                    path.display(),
                    entry.path
                ));
                failures += 1;
            }
            Err(e) => {
                output.error(&format!("{}: {}: {e}", path.display(), entry.path));
                failures += 1;
            }
        }
    }

    if failures == 0 {
        output.info(&format!("{}: ok", path.display()));
    }
    failures
}
