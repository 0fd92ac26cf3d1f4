//! Configuration error types.
//!
//! Every variant is fatal: a run with an invalid configuration aborts before
//! any API client is constructed.

use std::path::PathBuf;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while resolving the configuration snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "Missing required environment variables: {}. Please check your .env.test file.",
        .names.join(", ")
    )]
    MissingVariables { names: Vec<String> },

    #[error("{variable} is not a valid URL: {reason}")]
    InvalidPanelUrl { variable: String, reason: String },

    #[error("{variable} must start with http:// or https:// (found scheme '{scheme}')")]
    UnsupportedScheme { variable: String, scheme: String },

    #[error("{variable} must start with {prefix}")]
    InvalidCredentialPrefix { variable: String, prefix: String },

    #[error("{variable} must be a non-negative integer, got '{value}'")]
    InvalidNumber { variable: String, value: String },

    #[error("Failed to read environment file {}: {reason}", .path.display())]
    EnvFile { path: PathBuf, reason: String },
}
