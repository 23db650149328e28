//! Error types for the reconciliation library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::validate::ValidationIssue;

/// Comprehensive error type for all plan and remote operations.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// A remote object the run depends on does not exist or is inaccessible
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },
    /// Transport-level failures talking to the remote service
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote service answered with an error payload or status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// A failure annotated with the reconciliation step that produced it
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: Box<ProjectError>,
    },
    /// The run was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,
    /// The plan document failed validation
    #[error("Plan validation failed with {} error(s)", .issues.len())]
    Validation { issues: Vec<ValidationIssue> },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// YAML deserialization errors
    #[error("YAML error: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> ProjectError {
        ProjectError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl ProjectError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a not-found error for a remote object.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates an HTTP transport error with context.
    pub fn http(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            message: message.into(),
            source,
        }
    }

    /// Returns true when this error, or the error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Operation { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Returns true when this error, or the error it wraps, is a not-found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Extension trait for Result to attach the step that failed, in the spirit
/// of anyhow's `context`.
pub trait ResultExt<T> {
    /// Wrap the error with a fixed context message.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Wrap the error with a lazily built context message.
    fn with_context_lazy<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| ProjectError::Operation {
            context: context.to_string(),
            source: Box::new(e),
        })
    }

    fn with_context_lazy<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| ProjectError::Operation {
            context: f().to_string(),
            source: Box::new(e),
        })
    }
}

/// Result type alias for plan operations
pub type Result<T> = std::result::Result<T, ProjectError>;
