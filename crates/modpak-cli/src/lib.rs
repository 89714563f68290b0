//! modpak - mod package manager
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Command-line front end for authoring, inspecting, and resolving
//! `.mpk` mod containers.
//!
//! # Overview
//!
//! A `.mpk` container is a single file holding a mod's metadata, a file
//! table, and compressed content. The CLI packs a source directory into
//! a container, unpacks one back to disk, validates checksums, computes
//! a load order for a directory of installed mods, and checks remote
//! update descriptors.

pub mod cmd;
pub mod ui;

// Re-exports from other crates for convenience
pub use modpak_core::{CompressionKind, Container, PackageBuilder};
pub use modpak_schema::PackageMetadata;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "modpak")]
#[command(author, version, about = "modpak - mod package manager")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a container from a source directory
    Pack {
        /// Source directory containing mod.json and content
        source: PathBuf,
        /// Output container path (defaults to <mod_id>.mpk)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Compression: none, zlib, or lz4
        #[arg(long, default_value = "zlib")]
        compression: String,
    },
    /// Extract a container's content into a directory
    Unpack {
        /// Container file
        container: PathBuf,
        /// Destination directory (defaults to the container's stem)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a container's metadata and file listing
    Info {
        /// Container file
        container: PathBuf,
        /// List every file entry
        #[arg(short, long)]
        files: bool,
    },
    /// Verify a container's checksums
    Validate {
        /// Container file(s)
        #[arg(required = true)]
        containers: Vec<PathBuf>,
    },
    /// Compute a load order for a directory of installed mods
    Resolve {
        /// Directory of .mpk containers
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Host version to check compatibility against
        #[arg(long)]
        host_version: Option<semver::Version>,
    },
    /// Query update descriptors for a directory of installed mods
    #[command(name = "check-updates")]
    CheckUpdates {
        /// Directory of .mpk containers
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}
