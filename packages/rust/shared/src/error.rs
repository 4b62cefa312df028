//! Error types for rasaeco.
//!
//! Library crates use [`RasaecoError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Problems found in the scenarios themselves are not reported one by one
//! through this type. They are accumulated as [`Diagnostic`](crate::Diagnostic)s
//! and surface here only once a stage gate fails, as
//! [`RasaecoError::Validation`].

use std::path::PathBuf;

/// Top-level error type for all rasaeco operations.
#[derive(Debug, thiserror::Error)]
pub enum RasaecoError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Markup conversion or serialization error.
    #[error("markup error: {message}")]
    Markup { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// One or more scenarios failed validation; the run produced no output.
    #[error("validation failed with {} error(s)", .messages.len())]
    Validation { messages: Vec<String> },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RasaecoError>;

impl RasaecoError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a markup error from any displayable message.
    pub fn markup(msg: impl Into<String>) -> Self {
        Self::Markup {
            message: msg.into(),
        }
    }

    /// Create a validation error from already rendered messages.
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation { messages }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The individual human-readable messages carried by this error.
    ///
    /// Every variant other than [`RasaecoError::Validation`] yields a single
    /// message, its display form.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}
