//! Info command - show container metadata and contents

use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use modpak_core::Container;

use crate::ui::format_size;

/// Show metadata and an optional file listing for a container.
pub fn info(container_path: &Path, list_files: bool) -> Result<()> {
    let container = Container::open(container_path)
        .with_context(|| format!("Failed to open {}", container_path.display()))?;
    let meta = container.metadata()?;
    let entries = container.read_file_table()?;
    let header = container.header();

    let lw = 14;

    println!();
    println!(
        "  {} {}",
        meta.mod_id.as_str().white().bold(),
        meta.version.to_string().dark_grey()
    );
    if !meta.name.is_empty() {
        println!("  {}", meta.name);
    }
    if !meta.description.is_empty() {
        println!("  {}", meta.description);
    }
    println!();

    if !meta.author.is_empty() {
        println!("  {:<lw$}{}", "author", meta.author);
    }
    if let Some(min) = &meta.min_host_version {
        let max = meta
            .max_host_version
            .as_ref()
            .map_or_else(|| "any".to_string(), ToString::to_string);
        println!("  {:<lw$}{min} .. {max}", "host");
    }
    println!(
        "  {:<lw$}{} ({} entries, {})",
        "contents",
        format_size(u64::from(header.total_file_size)),
        entries.len(),
        header.compression
    );
    println!(
        "  {:<lw$}{:?} priority {}",
        "load order", meta.load_order.phase, meta.load_order.priority
    );

    if !meta.dependencies.is_empty() {
        let deps: Vec<String> = meta
            .dependencies
            .iter()
            .map(|d| {
                if d.required {
                    format!("{} {}", d.mod_id, d.version_constraint)
                } else {
                    format!("{} {} (optional)", d.mod_id, d.version_constraint)
                }
            })
            .collect();
        println!("  {:<lw$}{}", "requires", deps.join(", "));
    }
    if !meta.conflicts.is_empty() {
        let confs: Vec<String> = meta
            .conflicts
            .iter()
            .map(|c| c.mod_id.to_string())
            .collect();
        println!("  {:<lw$}{}", "conflicts", confs.join(", "));
    }
    if let Some(url) = &meta.update_url {
        println!("  {:<lw$}{url}", "updates");
    }

    if list_files {
        println!();
        for entry in &entries {
            let when = chrono::DateTime::from_timestamp(entry.timestamp as i64, 0)
                .unwrap_or_default()
                .format("%Y-%m-%d")
                .to_string();
            println!(
                "  {:>9}  {}  {}",
                format_size(u64::from(entry.uncompressed_size)),
                when.dark_grey(),
                entry.path
            );
        }
    }
    println!();

    Ok(())
}
