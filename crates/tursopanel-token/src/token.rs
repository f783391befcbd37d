//! Token minting and verification.
//!
//! Tokens are compact JWS strings signed with EdDSA (Ed25519). The header
//! carries the non-standard `is_group` flag, which `jsonwebtoken::Header`
//! cannot express, so minting assembles the three segments itself and
//! verification delegates signature and `exp` checks to `jsonwebtoken`.

use crate::claims::AccessClaims;
use crate::error::TokenError;
use crate::expiry::Expiry;
use crate::keys::{self, KeyPair};
use crate::scope::ResolvedScope;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, VerifyingKey};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const ALG_EDDSA: &str = "EdDSA";
const TYP_JWT: &str = "JWT";

/// JOSE header of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Set when the subject is a group of databases.
    #[serde(default)]
    pub is_group: bool,
}

/// A freshly minted full-access / read-only pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Token without the read-only marker.
    pub full_access: String,
    /// Token carrying `a = "ro"`.
    pub read_only: String,
    /// Claims of the full-access token.
    pub claims: AccessClaims,
    /// Requested validity.
    pub expiry: Expiry,
    /// Resolved `exp`.
    pub expires_at: DateTime<Utc>,
    /// Whether the subject is a group.
    pub is_group: bool,
}

/// Mints access token pairs.
pub struct TokenMinter {
    keypair: KeyPair,
}

impl TokenMinter {
    /// Create a new minter with the given keypair.
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// The signing keypair.
    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    /// Mint a pair issued now.
    pub fn mint_pair(
        &self,
        scope: &ResolvedScope,
        expiry: Expiry,
    ) -> Result<TokenPair, TokenError> {
        self.mint_pair_at(scope, expiry, Utc::now())
    }

    /// Mint a pair issued at `issued_at`.
    pub fn mint_pair_at(
        &self,
        scope: &ResolvedScope,
        expiry: Expiry,
        issued_at: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        if scope.subject.is_empty() {
            return Err(TokenError::TokenCreationFailed("empty subject".to_string()));
        }

        let expires_at = expiry.expires_at(issued_at)?;
        let header = TokenHeader {
            alg: ALG_EDDSA.to_string(),
            typ: TYP_JWT.to_string(),
            kid: Some(self.keypair.key_id()),
            is_group: scope.is_group,
        };
        let claims = AccessClaims::full(&scope.subject, scope.grantee, issued_at, expires_at);

        let full_access = self.sign(&header, &claims)?;
        let read_only = self.sign(&header, &claims.read_only())?;

        tracing::debug!(
            subject = %scope.subject,
            is_group = scope.is_group,
            exp = claims.exp,
            "minted token pair"
        );

        Ok(TokenPair {
            full_access,
            read_only,
            claims,
            expiry,
            expires_at,
            is_group: scope.is_group,
        })
    }

    fn sign(&self, header: &TokenHeader, claims: &AccessClaims) -> Result<String, TokenError> {
        let signing_input = format!("{}.{}", encode_segment(header)?, encode_segment(claims)?);
        let signature = self.keypair.signing_key().sign(signing_input.as_bytes());
        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

/// Public keys accepted by the verifier and published as a JWK set.
#[derive(Debug, Clone)]
pub struct KeyRing {
    active_kid: String,
    keys: Vec<(String, VerifyingKey)>,
}

impl KeyRing {
    /// A ring holding only the active signing key.
    pub fn new(active: VerifyingKey) -> Self {
        Self {
            active_kid: keys::key_id(&active),
            keys: vec![(keys::key_id(&active), active)],
        }
    }

    /// Add retired public keys (hex) that should still verify.
    pub fn with_previous_hex(mut self, previous: &[String]) -> Result<Self, TokenError> {
        for hex in previous {
            let key = keys::load_public_key_hex(hex)?;
            let kid = keys::key_id(&key);
            if !self.keys.iter().any(|(k, _)| *k == kid) {
                self.keys.push((kid, key));
            }
        }
        Ok(self)
    }

    /// Key id of the active key.
    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Look up a key by id.
    pub fn get(&self, kid: &str) -> Option<&VerifyingKey> {
        self.keys.iter().find(|(k, _)| k == kid).map(|(_, key)| key)
    }

    /// Number of keys in the ring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the ring is empty (never true for a ring built with `new`).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The JWK set external verifiers fetch.
    pub fn jwks(&self) -> JwkSet {
        JwkSet {
            keys: self
                .keys
                .iter()
                .map(|(kid, key)| Jwk {
                    kty: "OKP".to_string(),
                    crv: "Ed25519".to_string(),
                    alg: ALG_EDDSA.to_string(),
                    key_use: "sig".to_string(),
                    kid: kid.clone(),
                    x: URL_SAFE_NO_PAD.encode(key.to_bytes()),
                })
                .collect(),
        }
    }
}

/// A JSON Web Key for an Ed25519 public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub kid: String,
    pub x: String,
}

/// A JSON Web Key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Verifier for access tokens.
pub struct TokenVerifier {
    ring: KeyRing,
}

impl TokenVerifier {
    /// Create a new token verifier over the given key ring.
    pub fn new(ring: KeyRing) -> Self {
        Self { ring }
    }

    /// Verifier for a single public key.
    pub fn for_key(public_key: VerifyingKey) -> Self {
        Self::new(KeyRing::new(public_key))
    }

    /// Verify a token and extract claims.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let (header_segment, _, _) = split_token(token)?;
        let header: TokenHeader = decode_segment(header_segment)?;
        if header.alg != ALG_EDDSA {
            return Err(TokenError::VerificationFailed(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .clone()
            .unwrap_or_else(|| self.ring.active_kid().to_string());
        let key = self
            .ring
            .get(&kid)
            .ok_or_else(|| TokenError::UnknownKey { kid: kid.clone() })?;

        let decoding_key = DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(key.to_bytes()))
            .map_err(|e| TokenError::InvalidPublicKey(e.to_string()))?;
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<AccessClaims>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                _ => TokenError::VerificationFailed(e.to_string()),
            })?;

        Ok(VerifiedToken {
            claims: data.claims,
            is_group: header.is_group,
            kid,
        })
    }
}

/// A verified token with extracted claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedToken {
    pub claims: AccessClaims,
    pub is_group: bool,
    /// Id of the key that verified the signature.
    pub kid: String,
}

/// Decoded token contents without verification (for debugging).
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub header: TokenHeader,
    pub claims: AccessClaims,
}

/// Inspect a token without verification.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let (header, claims, _) = split_token(token)?;
    Ok(TokenInfo {
        header: decode_segment(header)?,
        claims: decode_segment(claims)?,
    })
}

fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None) => Ok((header, claims, signature)),
        _ => Err(TokenError::TokenParseFailed(
            "expected three dot-separated segments".to_string(),
        )),
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::TokenParseFailed(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{AccessLevel, GRANTEE_SENTINEL, Grantee};
    use chrono::Duration;

    fn scope(subject: &str) -> ResolvedScope {
        ResolvedScope {
            subject: subject.to_string(),
            is_group: false,
            grantee: Grantee::User(42),
        }
    }

    fn minter_and_verifier() -> (TokenMinter, TokenVerifier) {
        let keypair = KeyPair::generate();
        let verifier = TokenVerifier::for_key(keypair.public_key());
        (TokenMinter::new(keypair), verifier)
    }

    #[test]
    fn test_pair_differs_only_in_read_only_marker() {
        let (minter, verifier) = minter_and_verifier();
        let pair = minter.mint_pair(&scope("orders"), Expiry::Days(7)).unwrap();

        let full = verifier.verify(&pair.full_access).unwrap();
        let ro = verifier.verify(&pair.read_only).unwrap();

        assert_eq!(full.claims.access_level(), AccessLevel::Full);
        assert_eq!(ro.claims.access_level(), AccessLevel::ReadOnly);
        assert_eq!(
            AccessClaims {
                a: None,
                ..ro.claims.clone()
            },
            full.claims
        );
        assert_eq!(full.is_group, ro.is_group);
        assert_ne!(pair.full_access, pair.read_only);
    }

    #[test]
    fn test_example_db_testing_user_42() {
        let (minter, verifier) = minter_and_verifier();
        let pair = minter.mint_pair(&scope("db-testing"), Expiry::from_days(30)).unwrap();

        let full = verifier.verify(&pair.full_access).unwrap().claims;
        assert_eq!(full.id, "db-testing");
        assert_eq!(full.jti, "db-testing");
        assert_eq!(full.uid, 42);
        assert_eq!(full.gid, GRANTEE_SENTINEL);
        assert_eq!(full.exp - full.iat, Duration::days(30).num_seconds());

        let ro = verifier.verify(&pair.read_only).unwrap().claims;
        assert_eq!(serde_json::to_value(&ro).unwrap()["a"], "ro");
    }

    #[test]
    fn test_unlimited_expiry_still_has_exp() {
        let (minter, verifier) = minter_and_verifier();
        let pair = minter.mint_pair(&scope("orders"), Expiry::from_days(0)).unwrap();
        let claims = verifier.verify(&pair.full_access).unwrap().claims;

        let years = (claims.exp - claims.iat) / Duration::days(365).num_seconds();
        assert!((99..=100).contains(&years), "unexpected span of {years} years");
        assert_eq!(pair.expiry.days(), 0);

        let raw = inspect_token_unverified(&pair.full_access).unwrap();
        assert_eq!(raw.claims.exp, claims.exp);
    }

    #[test]
    fn test_different_issue_times_give_different_signatures() {
        let (minter, _) = minter_and_verifier();
        let now = Utc::now();
        let first = minter.mint_pair_at(&scope("orders"), Expiry::Days(1), now).unwrap();
        let second = minter
            .mint_pair_at(&scope("orders"), Expiry::Days(1), now + Duration::seconds(1))
            .unwrap();

        let sig = |t: &str| t.rsplit('.').next().unwrap().to_string();
        assert_ne!(sig(&first.full_access), sig(&second.full_access));
        assert_ne!(sig(&first.read_only), sig(&second.read_only));
    }

    #[test]
    fn test_group_header_flag() {
        let (minter, verifier) = minter_and_verifier();
        let group_scope = ResolvedScope {
            subject: "analytics".to_string(),
            is_group: true,
            grantee: Grantee::Group(3),
        };
        let pair = minter.mint_pair(&group_scope, Expiry::Days(1)).unwrap();

        let verified = verifier.verify(&pair.full_access).unwrap();
        assert!(verified.is_group);
        assert_eq!(verified.claims.grantee(), Some(Grantee::Group(3)));

        let info = inspect_token_unverified(&pair.read_only).unwrap();
        assert!(info.header.is_group);
        assert_eq!(info.header.alg, "EdDSA");
    }

    #[test]
    fn test_other_key_rejects() {
        let (minter, _) = minter_and_verifier();
        let pair = minter.mint_pair(&scope("orders"), Expiry::Days(1)).unwrap();

        let stranger = TokenVerifier::for_key(KeyPair::generate().public_key());
        let err = stranger.verify(&pair.full_access).unwrap_err();
        assert!(matches!(err, TokenError::UnknownKey { .. }));
    }

    #[test]
    fn test_tampered_claims_reject() {
        let (minter, verifier) = minter_and_verifier();
        let pair = minter.mint_pair(&scope("orders"), Expiry::Days(1)).unwrap();

        let mut parts: Vec<String> = pair.full_access.split('.').map(String::from).collect();
        let mut claims = inspect_token_unverified(&pair.full_access).unwrap().claims;
        claims.id = "payroll".to_string();
        parts[1] = encode_segment(&claims).unwrap();
        let forged = parts.join(".");

        let err = verifier.verify(&forged).unwrap_err();
        assert!(matches!(err, TokenError::VerificationFailed(_)));
    }

    #[test]
    fn test_expired_token_rejects() {
        let (minter, verifier) = minter_and_verifier();
        let issued = Utc::now() - Duration::days(10);
        let pair = minter.mint_pair_at(&scope("orders"), Expiry::Days(1), issued).unwrap();

        let err = verifier.verify(&pair.full_access).unwrap_err();
        assert!(matches!(err, TokenError::TokenExpired));
    }

    #[test]
    fn test_expiry_has_no_grace_period() {
        let (minter, verifier) = minter_and_verifier();
        let issued = Utc::now() - Duration::days(1) - Duration::seconds(5);
        let pair = minter.mint_pair_at(&scope("orders"), Expiry::Days(1), issued).unwrap();

        let err = verifier.verify(&pair.read_only).unwrap_err();
        assert!(matches!(err, TokenError::TokenExpired));
    }

    #[test]
    fn test_out_of_range_expiry_is_an_error() {
        let (minter, _) = minter_and_verifier();
        let err = minter.mint_pair(&scope("orders"), Expiry::Days(u32::MAX)).unwrap_err();
        assert!(matches!(err, TokenError::ExpiryOutOfRange { days: u32::MAX }));
    }

    #[test]
    fn test_rotated_key_still_verifies() {
        let old = KeyPair::generate();
        let old_minter = TokenMinter::new(old.clone());
        let pair = old_minter.mint_pair(&scope("orders"), Expiry::Days(1)).unwrap();

        let new = KeyPair::generate();
        let ring = KeyRing::new(new.public_key())
            .with_previous_hex(&[old.public_key_hex()])
            .unwrap();
        assert_eq!(ring.len(), 2);

        let verified = TokenVerifier::new(ring).verify(&pair.full_access).unwrap();
        assert_eq!(verified.kid, old.key_id());
    }

    #[test]
    fn test_jwks_shape() {
        let keypair = KeyPair::generate();
        let jwks = KeyRing::new(keypair.public_key()).jwks();
        let json = serde_json::to_value(&jwks).unwrap();

        assert_eq!(json["keys"][0]["kty"], "OKP");
        assert_eq!(json["keys"][0]["crv"], "Ed25519");
        assert_eq!(json["keys"][0]["use"], "sig");
        assert_eq!(json["keys"][0]["kid"], keypair.key_id());
        assert_eq!(json["keys"][0]["x"], keypair.public_key_base64url());
    }

    #[test]
    fn test_malformed_token() {
        let err = inspect_token_unverified("not-a-token").unwrap_err();
        assert!(matches!(err, TokenError::TokenParseFailed(_)));
    }
}
