//! Check-updates command - query remote update descriptors

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;
use modpak_core::update::{self, CheckError, UpdateStatus};

use crate::ui::Output;

/// Check every container in `dir` against its update descriptor.
///
/// A failed check for one mod never aborts the others; failures are
/// reported inline and the command still exits successfully.
pub async fn check_updates(dir: &Path) -> Result<()> {
    let output = Output::new();
    let mods = super::scan_dir(dir)?;
    if mods.is_empty() {
        output.info(&format!("No containers found in {}", dir.display()));
        return Ok(());
    }

    let client = reqwest::Client::new();
    let mut available = 0usize;

    for (_, meta) in &mods {
        let status = update::check_update(&client, meta).await;
        match status {
            UpdateStatus::UpToDate => {
                output.info(&format!("{} {} is up to date", meta.mod_id, meta.version));
            }
            UpdateStatus::UpdateAvailable { version, reference } => {
                available += 1;
                println!(
                    "   {} {}  ->  {}",
                    meta.mod_id.as_str().white().bold(),
                    meta.version.to_string().dark_grey(),
                    version.to_string().green()
                );
                output.info(&format!("     {reference}"));
            }
            UpdateStatus::Deprecated {
                reason,
                alternative,
            } => {
                let mut msg = format!("{} is deprecated", meta.mod_id);
                if let Some(reason) = reason {
                    msg.push_str(&format!(": {reason}"));
                }
                if let Some(alt) = alternative {
                    msg.push_str(&format!(" (consider {alt})"));
                }
                output.warning(&msg);
            }
            UpdateStatus::CheckFailed { cause } => match cause {
                CheckError::NoUpdateLocation => {
                    output.info(&format!("{} declares no update location", meta.mod_id));
                }
                other => {
                    output.warning(&format!("{}: check failed: {other}", meta.mod_id));
                }
            },
        }
    }

    if available > 0 {
        output.success(&format!("{available} update(s) available"));
    }
    Ok(())
}
