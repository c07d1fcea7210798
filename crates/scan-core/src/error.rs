use thiserror::Error;

/// Errors raised while assembling a [`ScanInvocation`](crate::invocation::ScanInvocation).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("Data source name must not be empty")]
    EmptyDataSource,

    #[error("No {0} location was provided")]
    MissingLocation(&'static str),

    /// Inline text that was never written to a file.
    #[error("The {0} source must be written to a file before the scan can use it")]
    UnmaterializedSource(&'static str),

    #[error("Invalid variable name '{0}': names must be non-empty and must not contain '='")]
    InvalidVariable(String),

    #[error("Invalid environment override '{0}'")]
    InvalidEnvOverride(String),

    #[error("A parsed scan result was requested but no result artifact path was given")]
    ParsedResultWithoutArtifact,
}
