//! Engine configuration via `crosscheck.toml`
//!
//! A small set of tunables loaded from a config file. To change settings,
//! edit the file and restart. Every TTL and tolerance has a deployment
//! default matching the documented cache key families.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Config file name placed in the process working directory.
pub const CONFIG_FILE_NAME: &str = "crosscheck.toml";

/// Errors reading or parsing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file '{path}': {detail}")]
    Io {
        /// Path that was accessed.
        path: String,
        /// Underlying I/O failure.
        detail: String,
    },

    /// The file is not valid TOML or holds invalid values.
    #[error("failed to parse config file '{path}': {detail}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Parser diagnostic.
        detail: String,
    },
}

fn default_amount_tolerance() -> f64 {
    0.01
}
fn default_time_tolerance() -> u64 {
    300
}
fn default_stage_ttl() -> u64 {
    300
}
fn default_lock_ttl() -> u64 {
    30
}
fn default_throttle_ttl() -> u64 {
    5
}
fn default_stats_cache_ttl() -> u64 {
    120
}
fn default_cache_timeout() -> u64 {
    5
}
fn default_home_currency() -> String {
    "INR".to_string()
}
fn default_sources() -> Vec<String> {
    vec!["core".into(), "gateway".into(), "mobile".into()]
}
fn default_recent_limit() -> usize {
    100
}

/// Engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Absolute amount difference below which two amounts agree.
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: f64,
    /// Absolute timestamp difference, in seconds, below which two instants
    /// agree.
    #[serde(default = "default_time_tolerance")]
    pub time_tolerance_seconds: u64,
    /// Lifetime of staged in-flight views.
    #[serde(default = "default_stage_ttl")]
    pub stage_ttl_seconds: u64,
    /// Lifetime of the single-flight reconciliation lock. Bounds the effect
    /// of a crashed holder.
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
    /// Window of the repeat-check throttle counter.
    #[serde(default = "default_throttle_ttl")]
    pub throttle_ttl_seconds: u64,
    /// Lifetime of cached statistics payloads.
    #[serde(default = "default_stats_cache_ttl")]
    pub stats_cache_ttl_seconds: u64,
    /// Upper bound a coordination cache call may take before the engine
    /// treats it as failed and falls back to in-process state.
    #[serde(default = "default_cache_timeout")]
    pub cache_timeout_seconds: u64,
    /// Currency assumed when a source omits one.
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
    /// The closed set of expected stream names.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// How many verdicts the in-memory recent ring retains.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: default_amount_tolerance(),
            time_tolerance_seconds: default_time_tolerance(),
            stage_ttl_seconds: default_stage_ttl(),
            lock_ttl_seconds: default_lock_ttl(),
            throttle_ttl_seconds: default_throttle_ttl(),
            stats_cache_ttl_seconds: default_stats_cache_ttl(),
            cache_timeout_seconds: default_cache_timeout(),
            home_currency: default_home_currency(),
            sources: default_sources(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl ReconConfig {
    /// Time tolerance as a duration.
    pub fn time_tolerance(&self) -> Duration {
        Duration::from_secs(self.time_tolerance_seconds)
    }

    /// Stage TTL as a duration.
    pub fn stage_ttl(&self) -> Duration {
        Duration::from_secs(self.stage_ttl_seconds)
    }

    /// Lock TTL as a duration.
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }

    /// Throttle TTL as a duration.
    pub fn throttle_ttl(&self) -> Duration {
        Duration::from_secs(self.throttle_ttl_seconds)
    }

    /// Stats cache TTL as a duration.
    pub fn stats_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_cache_ttl_seconds)
    }

    /// Cache call timeout as a duration.
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_seconds)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Crosscheck reconciliation engine configuration

# Absolute amount difference below which two amounts agree.
amount_tolerance = 0.01

# Absolute timestamp difference, in seconds, below which two instants agree.
time_tolerance_seconds = 300

# Lifetime of staged in-flight views, in seconds.
stage_ttl_seconds = 300

# Lifetime of the single-flight reconciliation lock, in seconds.
lock_ttl_seconds = 30

# Window of the repeat-check throttle counter, in seconds.
throttle_ttl_seconds = 5

# Lifetime of cached statistics payloads, in seconds.
stats_cache_ttl_seconds = 120

# Upper bound a coordination cache call may take, in seconds.
cache_timeout_seconds = 5

# Currency assumed when a source omits one.
home_currency = "INR"

# The closed set of expected stream names.
sources = ["core", "gateway", "mobile"]

# How many verdicts the in-memory recent ring retains.
recent_limit = 100
"#
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
        }
        Ok(())
    }
}
