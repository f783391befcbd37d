//! # tursopanel-token
//!
//! Access tokens for libSQL databases managed by tursopanel.
//!
//! This crate provides functionality for:
//! - Loading or generating the Ed25519 signing key
//! - Resolving what a token is scoped to and who it is granted to
//! - Minting full-access / read-only token pairs
//! - Verifying tokens and publishing the public key set
//!
//! ## Token pair
//!
//! | Token | Claims | Header |
//! |-------|--------|--------|
//! | **Full access** | `jti`, `id`, `uid`, `gid`, `iat`, `exp` | `alg=EdDSA`, `kid`, `is_group` |
//! | **Read only** | same, plus `a = "ro"` | same |
//!
//! Exactly one of `uid` / `gid` names the grantee; the other holds
//! [`claims::GRANTEE_SENTINEL`]. Unlimited tokens expire after 100 years.

pub mod claims;
pub mod error;
pub mod expiry;
pub mod keygen;
pub mod keys;
pub mod scope;
pub mod token;

pub use claims::{AccessClaims, AccessLevel, Grantee};
pub use ed25519_dalek::VerifyingKey as PublicKey;
pub use error::TokenError;
pub use expiry::{Expiry, MAX_EXPIRATION_DAYS};
pub use keygen::{KeyOrigin, OpensslKeyGenerator, load_signing_key};
pub use keys::KeyPair;
pub use scope::{Directory, NoDirectory, ResolvedScope, ScopeResolver, Subject, Target, TokenScope};
pub use token::{
    JwkSet, KeyRing, TokenInfo, TokenMinter, TokenPair, TokenVerifier, VerifiedToken,
    inspect_token_unverified,
};
