//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur during key handling and token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Failed to generate keypair.
    #[error("failed to generate keypair: {0}")]
    KeyGenerationFailed(String),

    /// No key is configured and the ephemeral policy refuses to make one.
    #[error("no signing key configured: {0}")]
    KeyNotConfigured(String),

    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to parse public key.
    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    /// Failed to create token.
    #[error("failed to create token: {0}")]
    TokenCreationFailed(String),

    /// Failed to parse token.
    #[error("failed to parse token: {0}")]
    TokenParseFailed(String),

    /// Token verification failed.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// The requested validity cannot be represented.
    #[error("expiration of {days} days is out of range")]
    ExpiryOutOfRange { days: u32 },

    /// Token has expired.
    #[error("token has expired")]
    TokenExpired,

    /// No key in the ring matches the token's `kid`.
    #[error("unknown signing key: {kid}")]
    UnknownKey { kid: String },

    /// The subject id does not name an existing database or group.
    #[error("unknown {kind} id {id}")]
    UnknownSubject { kind: &'static str, id: u64 },

    /// The subject lookup itself failed.
    #[error("subject lookup failed: {0}")]
    Lookup(String),

    /// Failed to serialize/deserialize token parts.
    #[error("token serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
