//! Gateway configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top by the binary.
//!
//! ```toml
//! default_format = "CCGBANK"
//!
//! [lexicon]
//! model_dir = "model"
//! input_format = "tokenized"
//! max_length = 70
//! root_category = "S[dcl]"
//!
//! [server]
//! bind = "127.0.0.1:8084"
//! shutdown_grace_secs = 5
//! max_concurrent_requests = 64
//! ```

use crate::error::ConfigError;
use crate::lexicon::LexiconConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Output format of the default session.
    pub default_format: String,
    pub lexicon: LexiconConfig,
    pub server: ServerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { default_format: "CCGBANK".to_string(), lexicon: LexiconConfig::default(), server: ServerConfig::default() }
    }
}

impl GatewayConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace_secs: u64,
    /// Upper bound on boundary calls running at once.
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8084".to_string(), shutdown_grace_secs: 5, max_concurrent_requests: 64 }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
