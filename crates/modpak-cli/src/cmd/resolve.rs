//! Resolve command - compute a load order for installed mods

use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;
use modpak_core::resolver;

use crate::ui::Output;

/// Resolve the load order for every container in `dir`.
///
/// Mods that do not support the given host version are excluded before
/// resolution, with a warning each. On failure every resolution problem
/// is printed, not just the first.
pub fn resolve(dir: &Path, host_version: Option<&semver::Version>) -> Result<()> {
    let output = Output::new();
    let scanned = super::scan_dir(dir)?;
    if scanned.is_empty() {
        output.info(&format!("No containers found in {}", dir.display()));
        return Ok(());
    }

    let mut installed = Vec::with_capacity(scanned.len());
    for (path, meta) in scanned {
        if let Some(host) = host_version
            && !meta.supports_host(host)
        {
            output.warning(&format!(
                "{} {} does not support host {host}; excluded",
                meta.mod_id, meta.version
            ));
            continue;
        }
        tracing::debug!(mod_id = %meta.mod_id, path = %path.display(), "considering");
        installed.push(meta);
    }

    let resolution = match resolver::resolve(&installed) {
        Ok(r) => r,
        Err(failure) => {
            for problem in &failure.problems {
                output.error(&problem.to_string());
            }
            bail!("{} resolution problem(s)", failure.problems.len());
        }
    };

    for warning in &resolution.warnings {
        output.warning(&format!(
            "{} conflicts with {}: {}",
            warning.mod_a, warning.mod_b, warning.reason
        ));
    }

    println!();
    let mut position = 1usize;
    for (phase, ids) in resolver::group_by_phase(&resolution, &installed) {
        println!("  {}", format!("{phase:?}").dark_grey());
        for id in ids {
            println!("  {position:>3}. {id}");
            position += 1;
        }
    }
    println!();

    Ok(())
}
