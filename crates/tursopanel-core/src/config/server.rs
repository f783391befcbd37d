//! HTTP server and user seeding configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the admin API listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Lifetime of CLI bearer sessions, in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl ServerConfig {
    /// The `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Users seeded into the store.
///
/// When the store holds no users and none are listed here, an `admin` user
/// is bootstrapped from `admin_password_env` / `admin_password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Users created at startup if they do not exist yet.
    #[serde(default)]
    pub users: Vec<SeedUser>,

    /// Environment variable holding the bootstrap admin password.
    #[serde(default = "default_admin_password_env")]
    pub admin_password_env: String,

    /// Bootstrap admin password (prefer `admin_password_env`).
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            admin_password_env: default_admin_password_env(),
            admin_password: None,
        }
    }
}

impl AuthConfig {
    /// Bootstrap admin password, env var first.
    pub fn resolve_admin_password(&self) -> Option<String> {
        std::env::var(&self.admin_password_env)
            .ok()
            .or_else(|| self.admin_password.clone())
            .filter(|p| !p.trim().is_empty())
    }
}

/// A user seeded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    /// Username.
    pub username: String,
    /// Password (or environment variable reference).
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable containing the password.
    #[serde(default)]
    pub password_env: Option<String>,
    /// Whether the user bypasses ownership checks.
    #[serde(default)]
    pub admin: bool,
}

impl SeedUser {
    /// Get the password, checking password_env first.
    pub fn get_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Longest accepted CLI session lifetime: one year.
pub const MAX_SESSION_TTL_HOURS: u32 = 24 * 366;

fn default_session_ttl_hours() -> u32 {
    24 * 30
}

fn default_admin_password_env() -> String {
    "TURSOPANEL_ADMIN_PASSWORD".to_string()
}
