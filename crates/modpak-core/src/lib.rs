//! modpak-core - container format, dependency resolution, and update checking
//!
//! # Overview
//!
//! The core of the modpak package manager:
//!
//! - [`container`] reads the binary `.mpk` container format: fixed
//!   header, compressed metadata block, file table, content region.
//! - [`builder`] writes containers from a source directory, preserving
//!   every read-path invariant.
//! - [`integrity`] verifies whole-file and per-entry CRC32 checksums on
//!   demand (never implied by a successful open).
//! - [`resolver`] turns a snapshot of installed package metadata into a
//!   deterministic load order, or a complete list of problems.
//! - [`update`] checks a package's declared update location for newer,
//!   integrity-verified releases. Runs off the resolution path entirely.

pub mod builder;
pub mod compression;
pub mod container;
pub mod error;
pub mod integrity;
pub mod resolver;
pub mod update;

pub use builder::PackageBuilder;
pub use compression::CompressionKind;
pub use container::{Container, EntryReader, FileTableEntry, PackageHeader};
pub use error::{PakError, Result};
pub use resolver::{Resolution, ResolutionFailure, ResolutionProblem, resolve};
pub use update::{UpdateStatus, check_update};

/// User agent sent with update-check requests.
pub const USER_AGENT: &str = concat!("modpak/", env!("CARGO_PKG_VERSION"));
