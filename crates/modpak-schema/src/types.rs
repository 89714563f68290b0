//! Core identifier newtypes.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;

/// A validated mod identifier.
///
/// Mod identifiers double as namespace keys on disk, so they must be
/// non-empty and must not contain path separators. Validation happens at
/// construction and at deserialization time, never later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModId(String);

/// Errors that can occur when validating a [`ModId`].
#[derive(thiserror::Error, Debug)]
pub enum ModIdError {
    /// The identifier is the empty string.
    #[error("Mod identifier must not be empty")]
    Empty,

    /// The identifier contains a path separator character.
    #[error("Mod identifier '{0}' must not contain path separators")]
    PathSeparator(String),
}

impl ModId {
    /// Create a validated mod identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModIdError::Empty`] for an empty string and
    /// [`ModIdError::PathSeparator`] if the identifier contains `/` or `\`.
    pub fn new(id: impl Into<String>) -> Result<Self, ModIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModIdError::Empty);
        }
        if id.contains('/') || id.contains('\\') {
            return Err(ModIdError::PathSeparator(id));
        }
        Ok(Self(id))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ModId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for ModId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ModId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for ModId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for ModId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_id() {
        let id = ModId::new("cool-weapons").unwrap();
        assert_eq!(id.as_str(), "cool-weapons");
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(matches!(ModId::new(""), Err(ModIdError::Empty)));
    }

    #[test]
    fn test_path_separators_rejected() {
        assert!(matches!(
            ModId::new("mods/evil"),
            Err(ModIdError::PathSeparator(_))
        ));
        assert!(matches!(
            ModId::new("mods\\evil"),
            Err(ModIdError::PathSeparator(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<ModId>("\"ok-mod\"").is_ok());
        assert!(serde_json::from_str::<ModId>("\"\"").is_err());
        assert!(serde_json::from_str::<ModId>("\"a/b\"").is_err());
    }
}
