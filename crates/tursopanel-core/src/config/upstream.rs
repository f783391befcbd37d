//! Sibling process endpoints: sqld, the bridge, and the stats job.

use serde::{Deserialize, Serialize};

/// The database-serving process (`sqld`) admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqldConfig {
    /// Base URL, e.g. `http://127.0.0.1:8081`.
    #[serde(default = "default_sqld_url")]
    pub url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SqldConfig {
    fn default() -> Self {
        Self {
            url: default_sqld_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// The bridge process exposing provisioned database directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL, e.g. `http://127.0.0.1:4500`.
    #[serde(default = "default_bridge_url")]
    pub url: String,

    /// Shared secret sent as `Authorization: realm=<password>`.
    #[serde(default)]
    pub password: Option<String>,

    /// Environment variable containing the shared secret.
    #[serde(default)]
    pub password_env: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            password: None,
            password_env: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    /// Get the shared secret, checking password_env first.
    pub fn resolve_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

/// Periodic stats refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Whether `serve` spawns the refresh loop.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Width of the time bucket a sweep writes into. Sweeps within the same
    /// bucket overwrite each other.
    #[serde(default = "default_bucket_secs")]
    pub bucket_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            bucket_secs: default_bucket_secs(),
        }
    }
}

fn default_sqld_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:4500".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    900
}

fn default_bucket_secs() -> u64 {
    3600
}
