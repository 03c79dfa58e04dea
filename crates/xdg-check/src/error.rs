//! Error types for xdg-check

use std::path::PathBuf;
use thiserror::Error;

/// A single validator invocation did not succeed.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The validator ran and exited non-zero. `message` is its captured output.
    #[error("{message}")]
    Failed {
        program: String,
        code: i32,
        message: String,
    },

    /// The validator could not be started (missing binary, permissions).
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Required configuration is missing or malformed. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required value was not supplied
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// Repository identifier is not `owner/name`
    #[error("Invalid repository identifier '{0}', expected owner/name")]
    InvalidRepository(String),

    /// Event payload file could not be read
    #[error("Failed to read event payload {path}: {source}")]
    EventPayloadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Event payload is not valid JSON
    #[error("Failed to parse event payload: {0}")]
    EventPayloadParse(#[from] serde_json::Error),
}

/// A call to the hosting platform's REST API failed.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-success status
    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No remote API is configured for this run
    #[error("GitHub API unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

/// Commit status reporting failed.
#[derive(Error, Debug)]
pub enum ReportError {
    /// State outside `error | failure | pending | success`
    #[error("Invalid commit state '{0}', expected one of error, failure, pending, success")]
    InvalidState(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Candidate files could not be listed.
#[derive(Error, Debug)]
pub enum EnumerateError {
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list pull request files: {0}")]
    Api(#[from] ApiError),
}

/// Errors that abort a whole validation run.
#[derive(Error, Debug)]
pub enum XdgCheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Enumeration error: {0}")]
    Enumerate(#[from] EnumerateError),
}

/// Result type for run-level operations
pub type Result<T> = std::result::Result<T, XdgCheckError>;
