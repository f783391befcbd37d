//! CLI bearer sessions. The raw token is returned once; only its SHA-256 is
//! stored.

use crate::{Store, StoreError, UserRecord};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

impl Store {
    /// Start a session for `user_id`, returning the raw bearer token.
    pub async fn create_session(&self, user_id: i64, ttl: Duration) -> Result<String, StoreError> {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| StoreError::Config(format!("session lifetime {ttl} is out of range")))?;
        sqlx::query(
            "INSERT INTO cli_sessions (token_hash, user_id, created_at, expires_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(now.timestamp())
        .bind(expires_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    /// The user owning an unexpired session.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.username, u.password_hash, u.is_admin, u.created_at \
             FROM cli_sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token_hash = ? AND s.expires_at > ?",
        )
        .bind(hash_token(token))
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cli_sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM cli_sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
