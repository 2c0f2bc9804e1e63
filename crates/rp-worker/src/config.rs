//! Worker configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line
//! flags. The dispatch policy is part of configuration so that it is
//! fixed per deployment rather than decided ad hoc.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rp_protocol::codec::{DEFAULT_MAX_BYTES, DEFAULT_MAX_DEPTH};
use rp_protocol::Limits;

use crate::dispatch::DispatchPolicy;

/// Configuration for a worker process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// How malformed requests and unknown commands are treated
    pub policy: DispatchPolicy,

    /// Maximum value nesting depth accepted on the wire
    pub max_depth: usize,

    /// Maximum byte payload length / vector element count
    pub max_bytes: usize,

    /// Log level for the stderr diagnostic stream
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            policy: DispatchPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: DEFAULT_MAX_BYTES,
            log_level: "info".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Codec limits derived from this configuration
    pub fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
            max_bytes: self.max_bytes,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// Config file could not be read
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<WorkerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let config: WorkerConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.policy, DispatchPolicy::ContinueOnError);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.limits().max_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.toml");
        std::fs::write(
            &path,
            "policy = \"fail-fast\"\nmax_depth = 32\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.policy, DispatchPolicy::FailFast);
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.log_level, "debug");
        // Unspecified fields keep their defaults
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/worker.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
