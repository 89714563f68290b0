//! Content hashing for download verification.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// A validated SHA256 digest (64 hex characters).
///
/// This newtype ensures that all digests in the system are validated at
/// deserialization time, preventing invalid hex strings from propagating
/// through the codebase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

/// Error produced when a digest string fails validation.
#[derive(thiserror::Error, Debug)]
#[error("Invalid SHA256 digest: {0}")]
pub struct DigestError(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex portion is not exactly 64 ASCII hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            return Err(DigestError(format!(
                "expected 64 hex characters, got {} in '{s}'",
                hex.len()
            )));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError(format!("non-hex characters in '{s}'")));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Compute the SHA256 digest of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(hex::encode(digest))
    }

    /// Get the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_deterministic() {
        let h1 = Sha256Digest::compute(b"test data");
        let h2 = Sha256Digest::compute(b"test data");
        assert_eq!(h1, h2);
        assert_eq!(h1.as_str().len(), 64);
    }

    #[test]
    fn test_different_inputs_different_digests() {
        assert_ne!(
            Sha256Digest::compute(b"input 1"),
            Sha256Digest::compute(b"input 2")
        );
    }

    #[test]
    fn test_prefix_stripped_and_lowercased() {
        let hex = "A".repeat(64);
        let d = Sha256Digest::new(format!("sha256:{hex}")).unwrap();
        assert_eq!(d.as_str(), "a".repeat(64));
    }

    #[test]
    fn test_invalid_rejected() {
        assert!(Sha256Digest::new("short").is_err());
        assert!(Sha256Digest::new("g".repeat(64)).is_err());
    }
}
