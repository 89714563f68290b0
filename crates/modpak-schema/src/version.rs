//! Version constraint expressions.
//!
//! Supports:
//! - Exact: `=1.2.3` or `==1.2.3`
//! - Ordering: `>1.0.0`, `>=1.0.0`, `<2.0.0`, `<=2.0.0`
//! - Compatible patch: `~1.2.0` (>=1.2.0, <1.3.0)
//! - Compatible minor: `^1.2.0` (>=1.2.0, <2.0.0; for 0.x bases the
//!   range narrows to the same minor)
//!
//! Versions themselves are [`semver::Version`]: three numeric fields
//! compared numerically, with a pre-release suffix ordering below the
//! same release (`1.0.0-beta < 1.0.0`).

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Comparison operator of a constraint expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `=` / `==` exact match.
    Exact,
    /// `>` strictly newer.
    Greater,
    /// `>=` at least.
    GreaterEq,
    /// `<` strictly older.
    Less,
    /// `<=` at most.
    LessEq,
    /// `~` compatible patch.
    Tilde,
    /// `^` compatible minor.
    Caret,
}

/// A parsed version constraint.
///
/// Malformed constraint strings are rejected here, at parse time; once a
/// `VersionConstraint` exists, [`matches`](Self::matches) is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    op: ConstraintOp,
    base: Version,
}

/// Error produced when a constraint expression cannot be parsed.
#[derive(thiserror::Error, Debug)]
#[error("Invalid version constraint '{input}': {reason}")]
pub struct ConstraintError {
    /// The offending expression.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl VersionConstraint {
    /// Parse a constraint expression like `>=1.2.0` or `^0.4.1`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if the operator is unknown or the
    /// version part is not a valid `major.minor.patch` version.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let s = input.trim();
        let (op, rest) = if let Some(rest) = s.strip_prefix("==") {
            (ConstraintOp::Exact, rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (ConstraintOp::GreaterEq, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (ConstraintOp::LessEq, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (ConstraintOp::Exact, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (ConstraintOp::Greater, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (ConstraintOp::Less, rest)
        } else if let Some(rest) = s.strip_prefix('~') {
            (ConstraintOp::Tilde, rest)
        } else if let Some(rest) = s.strip_prefix('^') {
            (ConstraintOp::Caret, rest)
        } else {
            return Err(ConstraintError {
                input: input.to_string(),
                reason: "missing operator (expected one of =, ==, >, >=, <, <=, ~, ^)".to_string(),
            });
        };

        let base = Version::parse(rest.trim()).map_err(|e| ConstraintError {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { op, base })
    }

    /// The operator of this constraint.
    pub fn op(&self) -> ConstraintOp {
        self.op
    }

    /// The base version of this constraint.
    pub fn base(&self) -> &Version {
        &self.base
    }

    /// Check whether `version` satisfies this constraint. Total: never
    /// panics, never errors.
    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            ConstraintOp::Exact => *version == self.base,
            ConstraintOp::Greater => *version > self.base,
            ConstraintOp::GreaterEq => *version >= self.base,
            ConstraintOp::Less => *version < self.base,
            ConstraintOp::LessEq => *version <= self.base,
            ConstraintOp::Tilde => *version >= self.base && *version < next_minor(&self.base),
            ConstraintOp::Caret => {
                let upper = if self.base.major == 0 {
                    // 0.x releases are not compatible across minors
                    next_minor(&self.base)
                } else {
                    next_major(&self.base)
                };
                *version >= self.base && *version < upper
            }
        }
    }
}

fn next_minor(v: &Version) -> Version {
    Version::new(v.major, v.minor + 1, 0)
}

fn next_major(v: &Version) -> Version {
    Version::new(v.major + 1, 0, 0)
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self.op {
            ConstraintOp::Exact => "=",
            ConstraintOp::Greater => ">",
            ConstraintOp::GreaterEq => ">=",
            ConstraintOp::Less => "<",
            ConstraintOp::LessEq => "<=",
            ConstraintOp::Tilde => "~",
            ConstraintOp::Caret => "^",
        };
        write!(f, "{op}{}", self.base)
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
