//! Ed25519 keypair management for token signing.

use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{SECRET_KEY_LENGTH, SigningKey, VerifyingKey};
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// Number of public key bytes that make up a key id.
const KEY_ID_BYTES: usize = 8;

/// An Ed25519 keypair for signing and verifying access tokens.
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("kid", &self.key_id())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Expand a 32-byte seed into a keypair.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// Load a keypair from raw seed bytes.
    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        let seed: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            TokenError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// Load a keypair from a hex-encoded seed.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, TokenError> {
        let bytes =
            hex::decode(hex.trim()).map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?;
        Self::from_private_key_bytes(&bytes)
    }

    /// Load a keypair from a PKCS#8 PEM document (as written by `openssl genpkey`).
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, TokenError> {
        let signing = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing })
    }

    /// Parse key material that is either PEM or a hex seed.
    pub fn parse(material: &str) -> Result<Self, TokenError> {
        let material = material.trim();
        if material.starts_with("-----BEGIN") {
            Self::from_pkcs8_pem(material)
        } else {
            Self::from_private_key_hex(material)
        }
    }

    /// Get the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    /// Get the public key.
    pub fn public_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Get the private key seed as hex string.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing.to_bytes())
    }

    /// Get the public key as hex string.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().to_bytes())
    }

    /// Get the public key as unpadded base64url, the JWK `x` member.
    pub fn public_key_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.public_key().to_bytes())
    }

    /// Key id placed in the `kid` header of every token this key signs.
    pub fn key_id(&self) -> String {
        key_id(&self.public_key())
    }

    /// Save the keypair to files.
    pub fn save_to_files(
        &self,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<(), TokenError> {
        std::fs::write(private_key_path, self.private_key_hex())?;
        std::fs::write(public_key_path, self.public_key_hex())?;
        Ok(())
    }

    /// Load a keypair from a private key file (hex or PEM).
    pub fn load_from_file(private_key_path: &Path) -> Result<Self, TokenError> {
        let material = std::fs::read_to_string(private_key_path)?;
        Self::parse(&material)
    }
}

/// Derive the key id for a public key.
pub fn key_id(public_key: &VerifyingKey) -> String {
    hex::encode(&public_key.to_bytes()[..KEY_ID_BYTES])
}

/// Load a public key from hex string (for verification-only scenarios).
pub fn load_public_key_hex(hex: &str) -> Result<VerifyingKey, TokenError> {
    let bytes = hex::decode(hex.trim()).map_err(|e| TokenError::InvalidPublicKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        TokenError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| TokenError::InvalidPublicKey(e.to_string()))
}

/// Load a public key from a file.
pub fn load_public_key_file(path: &Path) -> Result<VerifyingKey, TokenError> {
    let hex = std::fs::read_to_string(path)?;
    load_public_key_hex(hex.trim())
}
