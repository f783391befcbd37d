//! Row types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use sqlx::types::Json;
use tursopanel_token::Grantee;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String, // Argon2 PHC string
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DatabaseRecord {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub group_id: Option<i64>,
    pub is_schema: bool,
    /// Schema database this one is attached to.
    pub schema_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DatabaseRecord {
    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for [`crate::Store::create_database`].
#[derive(Debug, Clone)]
pub struct NewDatabase {
    pub name: String,
    pub owner_id: i64,
    pub group_id: Option<i64>,
    pub is_schema: bool,
    pub schema_name: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// What a group deletion cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupDeletion {
    pub detached_databases: u64,
    pub removed_tokens: u64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TokenRecord {
    pub id: i64,
    pub name: String,
    pub full_access_token: String,
    pub read_only_token: String,
    /// `0` for unlimited tokens.
    pub expiration_days: i64,
    pub expires_at: DateTime<Utc>,
    pub grantee_user_id: Option<i64>,
    pub grantee_team_id: Option<i64>,
    pub database_id: Option<i64>,
    pub group_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    pub fn grantee(&self) -> Option<Grantee> {
        match (self.grantee_user_id, self.grantee_team_id) {
            (Some(uid), None) => u64::try_from(uid).ok().map(Grantee::User),
            (None, Some(gid)) => u64::try_from(gid).ok().map(Grantee::Group),
            _ => None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Not revoked and not past `expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && self.expires_at > now
    }
}

/// Input for [`crate::Store::insert_token`].
#[derive(Debug, Clone)]
pub struct NewToken {
    pub name: String,
    pub full_access_token: String,
    pub read_only_token: String,
    pub expiration_days: u32,
    pub expires_at: DateTime<Utc>,
    pub grantee: Grantee,
    pub database_id: Option<i64>,
    pub group_id: Option<i64>,
    pub created_by: i64,
}

/// Counters sampled from sqld for one database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSample {
    pub rows_read: i64,
    pub rows_written: i64,
    pub storage_bytes: i64,
    pub write_requests_delegated: i64,
    pub replication_index: i64,
    pub query_count: i64,
    pub top_queries: serde_json::Value,
    pub slowest_queries: serde_json::Value,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatsRecord {
    pub database_id: i64,
    /// Unix seconds.
    pub bucket_start: i64,
    pub rows_read: i64,
    pub rows_written: i64,
    pub storage_bytes: i64,
    pub write_requests_delegated: i64,
    pub replication_index: i64,
    pub query_count: i64,
    pub top_queries: Json<serde_json::Value>,
    pub slowest_queries: Json<serde_json::Value>,
    pub fetched_at: DateTime<Utc>,
}
