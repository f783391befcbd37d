//! Claims carried by database access tokens.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored in whichever of `uid` / `gid` does not name the grantee.
/// Row ids start at 1, so it never names a real user or group.
pub const GRANTEE_SENTINEL: u64 = 0;

/// Who a token is granted to. Exactly one of the two ids is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grantee {
    /// An individual user.
    User(u64),
    /// A team group.
    Group(u64),
}

impl Grantee {
    /// The `uid` claim value.
    pub fn uid(self) -> u64 {
        match self {
            Grantee::User(id) => id,
            Grantee::Group(_) => GRANTEE_SENTINEL,
        }
    }

    /// The `gid` claim value.
    pub fn gid(self) -> u64 {
        match self {
            Grantee::User(_) => GRANTEE_SENTINEL,
            Grantee::Group(id) => id,
        }
    }

    /// Rebuild the grantee from claim values.
    pub fn from_claims(uid: u64, gid: u64) -> Option<Self> {
        match (uid, gid) {
            (GRANTEE_SENTINEL, GRANTEE_SENTINEL) => None,
            (uid, GRANTEE_SENTINEL) => Some(Grantee::User(uid)),
            (GRANTEE_SENTINEL, gid) => Some(Grantee::Group(gid)),
            _ => None,
        }
    }
}

/// Access granted by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Reads and writes.
    Full,
    /// Reads only.
    ReadOnly,
}

/// Value of the `a` claim. Only read-only tokens carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMarker {
    #[serde(rename = "ro")]
    ReadOnly,
}

/// The claim set of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (database or group name). Mirrors `id`.
    pub jti: String,

    /// Subject (database or group name).
    pub id: String,

    /// Grantee user id, or [`GRANTEE_SENTINEL`].
    pub uid: u64,

    /// Grantee group id, or [`GRANTEE_SENTINEL`].
    pub gid: u64,

    /// Read-only marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<AccessMarker>,

    /// Issued at (seconds since the epoch).
    pub iat: i64,

    /// Expires at (seconds since the epoch). Always present.
    pub exp: i64,
}

impl AccessClaims {
    /// Full-access claims for `subject`.
    pub fn full(
        subject: &str,
        grantee: Grantee,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            jti: subject.to_string(),
            id: subject.to_string(),
            uid: grantee.uid(),
            gid: grantee.gid(),
            a: None,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// The read-only sibling of these claims.
    pub fn read_only(&self) -> Self {
        Self {
            a: Some(AccessMarker::ReadOnly),
            ..self.clone()
        }
    }

    /// Access level encoded by the `a` claim.
    pub fn access_level(&self) -> AccessLevel {
        match self.a {
            Some(AccessMarker::ReadOnly) => AccessLevel::ReadOnly,
            None => AccessLevel::Full,
        }
    }

    /// Grantee encoded by `uid` / `gid`.
    pub fn grantee(&self) -> Option<Grantee> {
        Grantee::from_claims(self.uid, self.gid)
    }

    /// `exp` as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Check if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
