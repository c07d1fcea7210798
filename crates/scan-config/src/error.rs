use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors raised while constructing, persisting or resolving scan inputs.
///
/// All of these surface before the scan engine is invoked.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// None of the file, directory or inline options was set.
    #[error("Please provide at least one Soda {kind} option (file, directory or inline YAML)")]
    MissingSource { kind: &'static str },

    /// Inline text did not parse as YAML.
    #[error("Invalid {kind} YAML: {message}")]
    InvalidYaml { kind: &'static str, message: String },

    #[error("Failed to persist {kind} to {}: {source}", .path.display())]
    Persist {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {kind} directory {}: {source}", .path.display())]
    ReadDirectory {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No YAML files found in {kind} directory {}", .path.display())]
    EmptyDirectory { kind: &'static str, path: PathBuf },

    /// A precedence order that is not a permutation of file, directory and inline.
    #[error("Invalid source precedence: {0}")]
    InvalidPrecedence(String),

    #[error("Invalid Soda Cloud credentials: {0}")]
    Credentials(String),
}
