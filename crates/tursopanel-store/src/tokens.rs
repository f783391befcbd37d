//! Access token records. Records are never updated in place; revocation is a
//! soft delete.

use crate::{NewToken, Store, StoreError, TokenRecord};
use chrono::Utc;
use tursopanel_token::Grantee;

const TOKEN_COLUMNS: &str = "id, name, full_access_token, read_only_token, expiration_days, \
     expires_at, grantee_user_id, grantee_team_id, database_id, group_id, created_by, \
     created_at, deleted_at";

impl Store {
    pub async fn insert_token(&self, new: &NewToken) -> Result<TokenRecord, StoreError> {
        let (grantee_user_id, grantee_team_id) = grantee_columns(new.grantee)?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO access_tokens (name, full_access_token, read_only_token, \
             expiration_days, expires_at, grantee_user_id, grantee_team_id, database_id, \
             group_id, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.full_access_token)
        .bind(&new.read_only_token)
        .bind(i64::from(new.expiration_days))
        .bind(new.expires_at)
        .bind(grantee_user_id)
        .bind(grantee_team_id)
        .bind(new.database_id)
        .bind(new.group_id)
        .bind(new.created_by)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(TokenRecord {
            id,
            name: new.name.clone(),
            full_access_token: new.full_access_token.clone(),
            read_only_token: new.read_only_token.clone(),
            expiration_days: i64::from(new.expiration_days),
            expires_at: new.expires_at,
            grantee_user_id,
            grantee_team_id,
            database_id: new.database_id,
            group_id: new.group_id,
            created_by: new.created_by,
            created_at: now,
            deleted_at: None,
        })
    }

    /// Live (not revoked) records, optionally restricted to one creator.
    pub async fn list_tokens(
        &self,
        created_by: Option<i64>,
    ) -> Result<Vec<TokenRecord>, StoreError> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM access_tokens \
             WHERE deleted_at IS NULL AND (?1 IS NULL OR created_by = ?1) ORDER BY id"
        );
        Ok(sqlx::query_as::<_, TokenRecord>(&sql)
            .bind(created_by)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Any record with this id, revoked or not.
    pub async fn find_token(&self, id: i64) -> Result<Option<TokenRecord>, StoreError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM access_tokens WHERE id = ?");
        Ok(sqlx::query_as::<_, TokenRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// The record holding this token string as either its full-access or
    /// read-only token, revoked or not.
    pub async fn find_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM access_tokens \
             WHERE full_access_token = ?1 OR read_only_token = ?1 ORDER BY id DESC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, TokenRecord>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Soft delete. Returns false if the record is missing or already revoked.
    pub async fn revoke_token(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE access_tokens SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        let revoked = result.rows_affected() > 0;
        if revoked {
            tracing::info!(token_id = id, "revoked token");
        }
        Ok(revoked)
    }
}

fn grantee_columns(grantee: Grantee) -> Result<(Option<i64>, Option<i64>), StoreError> {
    let to_i64 = |id: u64| {
        i64::try_from(id).map_err(|_| StoreError::Config(format!("grantee id {id} out of range")))
    };
    Ok(match grantee {
        Grantee::User(id) => (Some(to_i64(id)?), None),
        Grantee::Group(id) => (None, Some(to_i64(id)?)),
    })
}
