//! Signing key bootstrap.
//!
//! The service signs with a configured, persisted key. When none is configured
//! the [`EphemeralKeyPolicy`] decides whether startup fails or a per-process
//! key is generated, either in-process or through the external `openssl` tool.

use crate::error::TokenError;
use crate::keys::KeyPair;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tursopanel_core::{EphemeralKeyPolicy, SigningConfig};

/// Where the active signing key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Loaded from `private_key_env` or `private_key_file`.
    Configured,
    /// Generated for this process by the external tool.
    EphemeralOpenssl,
    /// Generated for this process in-process.
    EphemeralRandom,
}

impl KeyOrigin {
    /// Whether tokens signed with this key stop verifying after a restart.
    pub fn is_ephemeral(self) -> bool {
        !matches!(self, KeyOrigin::Configured)
    }
}

/// Generates Ed25519 keys by shelling out to `openssl genpkey`.
///
/// The PEM file lands in a private temp directory that is removed when the
/// generator is dropped.
#[derive(Debug)]
pub struct OpensslKeyGenerator {
    program: PathBuf,
    workdir: TempDir,
}

impl OpensslKeyGenerator {
    /// Create a generator that invokes `program`.
    pub fn new(program: impl Into<PathBuf>) -> Result<Self, TokenError> {
        let workdir = tempfile::Builder::new().prefix("tursopanel-keygen").tempdir()?;
        Ok(Self {
            program: program.into(),
            workdir,
        })
    }

    /// Directory holding the intermediate PEM files.
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Generate a keypair.
    pub fn generate(&self) -> Result<KeyPair, TokenError> {
        let pem_path = self.workdir.path().join("ed25519.pem");

        let output = Command::new(&self.program)
            .args(["genpkey", "-algorithm", "ed25519", "-out"])
            .arg(&pem_path)
            .output()
            .map_err(|e| {
                TokenError::KeyGenerationFailed(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TokenError::KeyGenerationFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let pem = std::fs::read_to_string(&pem_path).map_err(|e| {
            TokenError::KeyGenerationFailed(format!(
                "{} produced no key at {}: {}",
                self.program.display(),
                pem_path.display(),
                e
            ))
        })?;
        let keypair = KeyPair::from_pkcs8_pem(&pem)?;
        std::fs::remove_file(&pem_path)?;
        Ok(keypair)
    }
}

/// Load the signing key described by `config`.
pub fn load_signing_key(config: &SigningConfig) -> Result<(KeyPair, KeyOrigin), TokenError> {
    if let Some(material) = config.resolve_private_key()? {
        let keypair = KeyPair::parse(&material)?;
        tracing::info!(kid = %keypair.key_id(), "loaded configured signing key");
        return Ok((keypair, KeyOrigin::Configured));
    }

    let (keypair, origin) = match config.ephemeral {
        EphemeralKeyPolicy::Refuse => {
            return Err(TokenError::KeyNotConfigured(
                "set signing.private_key_env or signing.private_key_file, \
                 or run `tursopanel keys generate`"
                    .to_string(),
            ));
        }
        EphemeralKeyPolicy::Openssl => {
            let generator = OpensslKeyGenerator::new(&config.openssl_program)?;
            (generator.generate()?, KeyOrigin::EphemeralOpenssl)
        }
        EphemeralKeyPolicy::Random => (KeyPair::generate(), KeyOrigin::EphemeralRandom),
    };

    tracing::warn!(
        kid = %keypair.key_id(),
        "using an ephemeral signing key; tokens will not verify on other instances \
         or after a restart"
    );
    Ok((keypair, origin))
}
