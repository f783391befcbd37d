//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tursopanel_sqld::BridgeDatabase;
use tursopanel_store::{DatabaseRecord, GroupRecord, StatsRecord, TokenRecord, UserRecord};
use tursopanel_token::{AccessClaims, AccessLevel, Grantee, Target};

// =============================================================================
// Session Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in_hours: u32,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Database Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDatabaseRequest {
    #[serde(default)]
    pub name: String,
    /// Group to attach the new database to.
    #[serde(default)]
    pub group: Option<String>,
    /// Create a schema database other databases can attach to.
    #[serde(default)]
    pub is_schema: bool,
    /// Schema database to attach to.
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseListResponse {
    pub databases: Vec<DatabaseRecord>,
}

// =============================================================================
// Group Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    /// Names of existing databases to attach.
    #[serde(default)]
    pub databases: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: GroupRecord,
    pub databases: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    pub groups: Vec<GroupResponse>,
}

#[derive(Debug, Serialize)]
pub struct GroupDeletedResponse {
    pub message: String,
    pub detached_databases: u64,
    pub removed_tokens: u64,
}

// =============================================================================
// Token Types
// =============================================================================

/// Issue a token pair.
///
/// ```json
/// {"target": {"database": {"name": "orders"}}, "grantee": {"user": 42}, "expiration_days": 30}
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub target: Target,
    pub grantee: Grantee,
    /// Days until expiry; `0` means unlimited. Defaults to the configured value.
    #[serde(default)]
    pub expiration_days: Option<u32>,
    /// Display name; defaults to the subject name.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: i64,
    pub name: String,
    pub full_access_token: String,
    pub read_only_token: String,
    pub expiration_days: i64,
    pub expires_at: DateTime<Utc>,
    pub is_group: bool,
    pub grantee: Option<Grantee>,
    pub database_id: Option<i64>,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<&TokenRecord> for TokenResponse {
    fn from(record: &TokenRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            full_access_token: record.full_access_token.clone(),
            read_only_token: record.read_only_token.clone(),
            expiration_days: record.expiration_days,
            expires_at: record.expires_at,
            is_group: record.group_id.is_some(),
            grantee: record.grantee(),
            database_id: record.database_id,
            group_id: record.group_id,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IntrospectRequest {
    pub token: String,
}

/// Token status for external verifiers.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IntrospectResponse {
    pub active: bool,
    /// Why the token is inactive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<AccessClaims>,
}

impl IntrospectResponse {
    pub fn inactive(reason: impl Into<String>) -> Self {
        Self {
            active: false,
            reason: Some(reason.into()),
            token_id: None,
            access: None,
            is_group: None,
            claims: None,
        }
    }
}

// =============================================================================
// Stats / Bridge Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StatsQueryParams {
    /// Number of buckets to return.
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub database: String,
    pub latest: Option<StatsRecord>,
    pub history: Vec<StatsRecord>,
}

#[derive(Debug, Serialize)]
pub struct BridgeDatabasesResponse {
    pub databases: Vec<BridgeDatabase>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
