//! Remote update descriptor.
//!
//! A small JSON document fetched from a package's declared `update_url`.
//! Describes the newest available release and how to verify it.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::hash::Sha256Digest;
use crate::types::ModId;

/// The document a mod's update location serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Newest published version.
    pub current_version: Version,

    /// Where to download the release from.
    pub download_reference: String,

    /// Expected SHA256 of the downloaded payload. A download is never
    /// trusted until it matches this digest.
    pub content_hash: Sha256Digest,

    /// Whether the mod has been deprecated by its author.
    #[serde(default)]
    pub is_deprecated: bool,

    /// Why the mod was deprecated, if it was.
    #[serde(default)]
    pub deprecation_reason: Option<String>,

    /// Suggested replacement mod, if any.
    #[serde(default)]
    pub alternative_mod_id: Option<ModId>,
}

/// Error produced when a descriptor fails validation.
#[derive(thiserror::Error, Debug)]
pub enum DescriptorError {
    /// The descriptor is not valid JSON or fails field validation.
    #[error("Malformed update descriptor: {0}")]
    Decode(#[from] serde_json::Error),

    /// The download reference is empty or not an HTTP(S) URL.
    #[error("Invalid download reference: {0}")]
    InvalidReference(String),
}

impl UpdateDescriptor {
    /// Decode a descriptor from raw bytes and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Decode`] for malformed JSON and
    /// [`DescriptorError::InvalidReference`] if the download reference is
    /// not an HTTP(S) URL.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let descriptor: Self = serde_json::from_slice(bytes)?;
        if !descriptor.download_reference.starts_with("http") {
            return Err(DescriptorError::InvalidReference(
                descriptor.download_reference,
            ));
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_descriptor() {
        let doc = format!(
            r#"{{
                "current_version": "2.0.0",
                "download_reference": "https://cdn.example.com/mod-2.0.0.mpk",
                "content_hash": "{}"
            }}"#,
            "ab".repeat(32)
        );
        let d = UpdateDescriptor::from_slice(doc.as_bytes()).unwrap();
        assert_eq!(d.current_version, Version::new(2, 0, 0));
        assert!(!d.is_deprecated);
        assert!(d.alternative_mod_id.is_none());
    }

    #[test]
    fn test_bad_hash_rejected() {
        let doc = r#"{
            "current_version": "2.0.0",
            "download_reference": "https://cdn.example.com/m.mpk",
            "content_hash": "nothex"
        }"#;
        assert!(UpdateDescriptor::from_slice(doc.as_bytes()).is_err());
    }

    #[test]
    fn test_non_http_reference_rejected() {
        let doc = format!(
            r#"{{
                "current_version": "2.0.0",
                "download_reference": "ftp://example.com/m.mpk",
                "content_hash": "{}"
            }}"#,
            "ab".repeat(32)
        );
        assert!(matches!(
            UpdateDescriptor::from_slice(doc.as_bytes()),
            Err(DescriptorError::InvalidReference(_))
        ));
    }
}
