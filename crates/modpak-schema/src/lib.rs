//! modpak-schema - shared types and wire format for modpak
//!
//! Everything that crosses a boundary lives here: the metadata document
//! embedded in every container, the remote update descriptor, and the
//! validated newtypes (`ModId`, `VersionConstraint`, `Sha256Digest`)
//! that keep malformed input from propagating through the codebase.

pub mod hash;
pub mod metadata;
pub mod types;
pub mod update;
pub mod version;

// Re-exports
pub use hash::Sha256Digest;
pub use metadata::{Conflict, Dependency, LoadOrderHint, LoadPhase, MetadataError, PackageMetadata};
pub use types::ModId;
pub use update::UpdateDescriptor;
pub use version::VersionConstraint;
