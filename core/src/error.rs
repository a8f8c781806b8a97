//! Error types for the photo API client and the controllers.
//!
//! # Design
//! `ApiError` is the single failure value every `PhotoApi` call can return.
//! Controllers never inspect the variant to decide what to do next; they only
//! surface `ApiError::message()` in their state. The variants exist so hosts
//! and tests can tell a dead network apart from the service refusing a call.
//!
//! `ConfigError` is separate because it is raised at construction time and is
//! not recoverable by retrying.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single photo service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection failure, timeout, or a non-2xx HTTP status. `status` is
    /// `None` when no response was received at all.
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    /// The service answered 2xx but its envelope reported `stat != "ok"`.
    #[error("{message}")]
    Application { code: Option<i64>, message: String },

    /// The response body could not be decoded into the expected payload.
    #[error("deserialization failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Human-readable message shown to the user in place of the data.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

/// Fatal misconfiguration detected before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required identifying parameter was absent or empty.
    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),
}
