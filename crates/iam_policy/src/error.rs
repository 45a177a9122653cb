//! Error types for policy validation and serialization.

use std::fmt;
use thiserror::Error;

/// Which side of an either/or field pair was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusivity {
    /// Both fields of the pair are present.
    BothPresent,
    /// Neither field of the pair is present.
    NeitherPresent,
}

impl fmt::Display for Exclusivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothPresent => f.write_str("both are present"),
            Self::NeitherPresent => f.write_str("neither is present"),
        }
    }
}

/// Errors that can occur while constructing or serializing a policy.
///
/// Every validation variant carries the dotted path of the offending field,
/// e.g. `Statement[1].Condition.Bool.aws:SecureTransport[0]`.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is absent.
    #[error("missing required field: {path}")]
    MissingField {
        /// Path of the missing field.
        path: String,
    },

    /// Both or neither of an either/or field pair are present.
    #[error("{path}: exactly one of '{first}' or '{second}' is required, {kind}")]
    Exclusivity {
        /// Path of the object holding the pair.
        path: String,
        /// First field of the pair.
        first: &'static str,
        /// Second field of the pair.
        second: &'static str,
        /// How the rule was violated.
        kind: Exclusivity,
    },

    /// Field has the right kind but a value outside the recognised set.
    #[error("invalid value for {path}: expected {expected}, found {found}")]
    InvalidValue {
        /// Path of the offending field.
        path: String,
        /// Description of the accepted values.
        expected: &'static str,
        /// The rejected value.
        found: String,
    },

    /// Field holds a value of the wrong kind.
    #[error("invalid type for {path}: expected {expected}, found {found}")]
    InvalidType {
        /// Path of the offending field.
        path: String,
        /// Description of the accepted kinds.
        expected: &'static str,
        /// Kind of the rejected value.
        found: &'static str,
    },

    /// Field is not part of the policy grammar.
    #[error("unknown field: {path}")]
    UnknownField {
        /// Path of the unknown field.
        path: String,
    },

    /// Principal object names none of its four principal kinds.
    #[error("{path} must name at least one of AWS, Federated, Service or CanonicalUser")]
    EmptyPrincipal {
        /// Path of the principal object.
        path: String,
    },

    /// JSON conversion error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the field path of a validation error.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingField { path }
            | Self::Exclusivity { path, .. }
            | Self::InvalidValue { path, .. }
            | Self::InvalidType { path, .. }
            | Self::UnknownField { path }
            | Self::EmptyPrincipal { path } => Some(path),
            Self::Json(_) => None,
        }
    }
}

/// Result type alias for policy operations.
pub type Result<T> = std::result::Result<T, Error>;
