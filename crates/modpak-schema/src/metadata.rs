//! The metadata document embedded in every container.
//!
//! Decoded from the (decompressed) metadata region as a JSON document.
//! `mod_id` and `version` are required; everything else is defaulted or
//! nullable. Validation of identifiers and constraint expressions happens
//! during deserialization, so a successfully decoded `PackageMetadata`
//! contains no malformed fields.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::types::ModId;
use crate::version::VersionConstraint;

/// A package's identity, dependencies, conflicts, and load-order hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Stable unique mod identifier. Doubles as a namespace key.
    pub mod_id: ModId,

    /// Semantic version of this release.
    pub version: Version,

    /// Human-readable display name.
    #[serde(default)]
    pub name: String,

    /// Author of the mod.
    #[serde(default)]
    pub author: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Minimum compatible host version.
    #[serde(default)]
    pub min_host_version: Option<Version>,

    /// Maximum compatible host version, if bounded.
    #[serde(default)]
    pub max_host_version: Option<Version>,

    /// Where to look for newer releases.
    #[serde(default)]
    pub update_url: Option<String>,

    /// Mods this package depends on, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Declared incompatibilities. Advisory, never auto-resolved.
    #[serde(default)]
    pub conflicts: Vec<Conflict>,

    /// Coarse phase plus fine priority for load ordering.
    #[serde(default)]
    pub load_order: LoadOrderHint,
}

/// A declared dependency on another mod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Identifier of the depended-on mod.
    pub mod_id: ModId,

    /// Constraint the installed version must satisfy.
    pub version_constraint: VersionConstraint,

    /// Whether resolution fails when the dependency is absent.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// A declared conflict with another mod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// Identifier of the conflicting mod.
    pub mod_id: ModId,

    /// Human-readable reason for the conflict.
    #[serde(default)]
    pub reason: String,
}

/// Coarse ordering bucket applied before fine-grained priority.
///
/// Variant order is load order: everything in an earlier phase loads
/// before anything in a later one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Base-game content replacements.
    #[default]
    Base,
    /// Additions layered on base content.
    AfterBase,
    /// Campaign content replacements.
    Campaign,
    /// Additions layered on campaign content.
    AfterCampaign,
    /// Map content replacements.
    Map,
    /// Additions layered on map content.
    AfterMap,
}

/// Load-order hint: coarse phase plus numeric priority.
///
/// Within a phase, higher priority loads earlier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoadOrderHint {
    /// Coarse ordering bucket.
    #[serde(default)]
    pub phase: LoadPhase,

    /// Fine-grained priority within the phase, descending.
    #[serde(default)]
    pub priority: i32,
}

/// Error produced when the metadata document cannot be decoded.
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    /// The document is not valid JSON or fails field validation.
    #[error("Malformed metadata document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PackageMetadata {
    /// Decode a metadata document from raw (decompressed) bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Decode`] if the document is not valid
    /// JSON, a required field (`mod_id`, `version`) is missing, or any
    /// identifier / constraint expression fails validation.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode this document as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (it cannot for well-formed
    /// in-memory values, but the signature propagates it anyway).
    pub fn to_vec(&self) -> Result<Vec<u8>, MetadataError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Check whether this package supports the given host version.
    ///
    /// An absent bound is treated as open on that side.
    pub fn supports_host(&self, host: &Version) -> bool {
        if let Some(min) = &self.min_host_version {
            if host < min {
                return false;
            }
        }
        if let Some(max) = &self.max_host_version {
            if host > max {
                return false;
            }
        }
        true
    }
}
