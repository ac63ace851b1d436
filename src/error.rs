//! Error types for the topology synthesizer.
//!
//! This module provides the error hierarchy for every step of the pipeline:
//! collecting and loading configuration, synthesizing the resource graph,
//! and handing the frozen graph over through an artifact store.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the crate.
#[derive(Debug, Error)]
pub enum WebuiError {
    /// Configuration loading and validation errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Topology synthesis errors.
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Configuration collector errors.
    #[error("Collector error: {0}")]
    Collect(#[from] CollectError),

    /// Artifact storage errors.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while loading a configuration document.
///
/// Loading is fail-fast: the first problem found is the one reported.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No document could be resolved at the given or default location.
    #[error("Configuration file not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The document is not structured data of the expected shape.
    #[error("Failed to parse configuration: {message}")]
    Malformed {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A required field is absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Dotted path of the missing field.
        field: String,
    },

    /// An enumerated field holds an unrecognized value.
    #[error("Invalid value '{value}' for {field}, expected one of: {expected}")]
    InvalidEnum {
        /// Dotted path of the field.
        field: String,
        /// The rejected value.
        value: String,
        /// Comma-separated list of accepted values.
        expected: String,
    },

    /// Only one half of the single-sign-on block was provided.
    #[error("Incomplete SSO configuration: sso.{missing} is required when sso.{present} is set")]
    IncompleteSso {
        /// The field that was provided.
        present: String,
        /// The field that is missing.
        missing: String,
    },
}

/// Errors raised while synthesizing the resource graph.
///
/// Every branch inside synthesis is total over a valid configuration, so the
/// only failure left is an external lookup the synthesizer depends on.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// An external lookup failed or returned nothing usable.
    #[error("External lookup '{name}' failed: {message}")]
    ExternalLookupFailed {
        /// Symbolic name that was looked up.
        name: String,
        /// Description of the failure.
        message: String,
    },
}

/// Errors raised by the configuration collector.
#[derive(Debug, Error)]
pub enum CollectError {
    /// One or more fields failed validation.
    #[error("{} field(s) failed validation", .failures.len())]
    InvalidFields {
        /// Every failure found, in field order.
        failures: Vec<FieldFailure>,
    },

    /// An interactive prompt could not be completed.
    #[error("Prompt failed: {message}")]
    PromptFailed {
        /// Description of the prompt failure.
        message: String,
    },

    /// The resulting document could not be written.
    #[error("Failed to write configuration to {path}: {message}")]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },
}

/// A single field-level validation failure reported by the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Field name as shown to the operator.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// Artifact storage errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Stored artifact is corrupted.
    #[error("Artifact is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// S3 backend error.
    #[error("S3 artifact backend error: {message}")]
    S3Error {
        /// Description of the S3 error.
        message: String,
    },

    /// Serialization error.
    #[error("Artifact serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// Artifact format version mismatch.
    #[error("Artifact version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected format version.
        expected: String,
        /// Found format version.
        found: String,
    },
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, WebuiError>;

impl WebuiError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the field-level failures if this is a collector validation error.
    #[must_use]
    pub fn field_failures(&self) -> &[FieldFailure] {
        match self {
            Self::Collect(CollectError::InvalidFields { failures }) => failures,
            _ => &[],
        }
    }
}

impl ConfigError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a malformed-document error.
    #[must_use]
    pub fn malformed(message: impl Into<String>, location: Option<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            location,
        }
    }
}

impl SynthesisError {
    /// Creates a lookup failure for the given symbolic name.
    #[must_use]
    pub fn lookup_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalLookupFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl ArtifactError {
    /// Creates an S3 error with the given message.
    #[must_use]
    pub fn s3(message: impl Into<String>) -> Self {
        Self::S3Error {
            message: message.into(),
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl FieldFailure {
    /// Creates a new field failure.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
