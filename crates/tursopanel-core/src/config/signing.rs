//! Token signing configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the Ed25519 key that signs access tokens.
///
/// The private key is resolved from `private_key_env` first, then
/// `private_key_file`. Both hold either a hex-encoded 32-byte seed or a
/// PKCS#8 PEM document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Environment variable containing the private key.
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Path to the private key file.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Path to the public key file (used by verification-only tooling).
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,

    /// Hex-encoded public keys of retired signing keys. They stay in the
    /// published key set so tokens signed before a rotation keep verifying.
    #[serde(default)]
    pub previous_public_keys: Vec<String>,

    /// What to do when no private key is configured.
    #[serde(default)]
    pub ephemeral: EphemeralKeyPolicy,

    /// Program invoked when `ephemeral` is `openssl`.
    #[serde(default = "default_openssl_program")]
    pub openssl_program: PathBuf,

    /// Expiration applied when a token request does not specify one.
    /// `0` means unlimited.
    #[serde(default = "default_expiration_days")]
    pub default_expiration_days: u32,
}

/// Fallback when no signing key is configured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EphemeralKeyPolicy {
    /// Fail startup.
    #[default]
    Refuse,
    /// Generate a per-process key with the external `openssl` tool.
    Openssl,
    /// Generate a per-process key in-process.
    Random,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            private_key_env: None,
            private_key_file: None,
            public_key_file: None,
            previous_public_keys: Vec::new(),
            ephemeral: EphemeralKeyPolicy::default(),
            openssl_program: default_openssl_program(),
            default_expiration_days: default_expiration_days(),
        }
    }
}

impl SigningConfig {
    /// Resolve the private key from environment or file.
    pub fn resolve_private_key(&self) -> Result<Option<String>, std::io::Error> {
        // Try environment variable first
        if let Some(env_var) = &self.private_key_env
            && let Ok(key) = std::env::var(env_var)
            && !key.trim().is_empty()
        {
            return Ok(Some(key.trim().to_string()));
        }

        // Try file path
        if let Some(path) = &self.private_key_file
            && path.exists()
        {
            let key = std::fs::read_to_string(path)?;
            return Ok(Some(key.trim().to_string()));
        }

        Ok(None)
    }

    /// Resolve the public key from file.
    pub fn resolve_public_key(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(path) = &self.public_key_file
            && path.exists()
        {
            let key = std::fs::read_to_string(path)?;
            return Ok(Some(key.trim().to_string()));
        }
        Ok(None)
    }
}

fn default_openssl_program() -> PathBuf {
    PathBuf::from("openssl")
}

fn default_expiration_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_private_key_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private.key");
        std::fs::write(&path, "abcd\n").unwrap();

        let config = SigningConfig {
            private_key_file: Some(path),
            ..Default::default()
        };
        assert_eq!(config.resolve_private_key().unwrap().as_deref(), Some("abcd"));
    }

    #[test]
    fn test_missing_key_resolves_to_none() {
        let config = SigningConfig {
            private_key_env: Some("TURSOPANEL_TEST_UNSET_KEY_VAR".to_string()),
            private_key_file: Some(PathBuf::from("/nonexistent/private.key")),
            ..Default::default()
        };
        assert!(config.resolve_private_key().unwrap().is_none());
    }
}
