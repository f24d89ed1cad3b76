//! Error taxonomy.
//!
//! Errors are layered the same way the gateway is:
//!
//! ```text
//! EngineFactory::build ──▶ BuildError ──┐
//!                                       ├──▶ GatewayError (boundary)
//! Reader / Engine / Formatter ──▶ BackendError ──┘
//! ```
//!
//! Nothing below the [`RequestRouter`](crate::RequestRouter) returns a
//! `GatewayError`; the router is the single place where lower-level failures
//! are translated into the four boundary kinds.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to construct an engine triple.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Model or resource path absent or unreadable.
    #[error("couldn't load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// The output format is unknown, or needs an input shape the configured
    /// reader cannot provide.
    #[error("unsupported output format '{format}': {reason}")]
    UnsupportedFormat { format: String, reason: String },
}

impl BuildError {
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BuildError::ModelLoad { path: path.into(), reason: reason.into() }
    }

    pub fn unsupported_format(format: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::UnsupportedFormat { format: format.into(), reason: reason.into() }
    }
}

/// Failure raised by a backend collaborator while serving `infer`.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("format failed: {0}")]
    Format(String),

    /// A panic unwound out of the locked pipeline.
    #[error("engine panicked: {0}")]
    Panicked(String),
}

/// Boundary-level error returned by the request router.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    ModelLoad(String),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("engine failure: {0}")]
    EngineFailure(#[from] BackendError),
}

impl GatewayError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        GatewayError::InvalidArgument(msg.into())
    }

    /// Stable snake_case label, used in logs and on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidArgument(_) => "invalid_argument",
            GatewayError::ModelLoad(_) => "model_load_error",
            GatewayError::UnsupportedFormat(_) => "unsupported_format_error",
            GatewayError::EngineFailure(_) => "engine_failure",
        }
    }
}

impl From<BuildError> for GatewayError {
    fn from(err: BuildError) -> Self {
        match &err {
            BuildError::ModelLoad { .. } => GatewayError::ModelLoad(err.to_string()),
            BuildError::UnsupportedFormat { .. } => GatewayError::UnsupportedFormat(err.to_string()),
        }
    }
}

/// Failure to read or parse a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
