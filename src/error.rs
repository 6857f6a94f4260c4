//! Error types for Trellis.
//!
//! Fatal conditions are surfaced as [`TrellisError`]. Recoverable problems
//! (bad patterns, clamped depths, unresolved references) never abort a
//! generation; they travel with the diagram as [`Warning`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fatal errors raised while loading input or generating a diagram.
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Configuration text that cannot be interpreted at all.
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested root does not exist in the code model.
    #[error("unknown root entity: {0}")]
    UnknownRoot(String),

    /// The request was cancelled before the diagram was complete.
    #[error("generation cancelled: {0}")]
    Cancelled(String),

    /// An internal consistency check failed. Never recovered.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, TrellisError>;

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A configuration value was malformed or out of range and was replaced.
    Configuration,
    /// A referenced entity could not be resolved; a stub node stands in for it.
    UnresolvedReference,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::Configuration => write!(f, "configuration"),
            WarningKind::UnresolvedReference => write!(f, "unresolved_reference"),
        }
    }
}

/// A recoverable problem attached to a generated diagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Configuration,
            message: message.into(),
        }
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnresolvedReference,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrellisError::UnknownRoot("com.acme.Missing".to_string());
        assert_eq!(err.to_string(), "unknown root entity: com.acme.Missing");
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::configuration("bad pattern '['");
        assert_eq!(warning.to_string(), "[configuration] bad pattern '['");
        assert_eq!(
            Warning::unresolved("x").kind,
            WarningKind::UnresolvedReference
        );
    }
}
