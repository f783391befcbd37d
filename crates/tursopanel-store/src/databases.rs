//! Database records. Soft delete archives a database; force delete removes
//! it together with its tokens and stats.

use crate::{DatabaseRecord, NewDatabase, Store, StoreError};
use chrono::Utc;

const DATABASE_COLUMNS: &str =
    "id, name, owner_id, group_id, is_schema, schema_name, created_at, deleted_at";

impl Store {
    pub async fn create_database(&self, new: &NewDatabase) -> Result<DatabaseRecord, StoreError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO databases (name, owner_id, group_id, is_schema, schema_name, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(new.owner_id)
        .bind(new.group_id)
        .bind(new.is_schema)
        .bind(&new.schema_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::conflict_on_unique(e, "database", &new.name))?
        .last_insert_rowid();

        tracing::info!(database = %new.name, owner_id = new.owner_id, "created database");

        Ok(DatabaseRecord {
            id,
            name: new.name.clone(),
            owner_id: new.owner_id,
            group_id: new.group_id,
            is_schema: new.is_schema,
            schema_name: new.schema_name.clone(),
            created_at: now,
            deleted_at: None,
        })
    }

    /// Active databases, optionally restricted to one owner.
    pub async fn list_databases(
        &self,
        owner_id: Option<i64>,
    ) -> Result<Vec<DatabaseRecord>, StoreError> {
        self.list_databases_where("deleted_at IS NULL", owner_id).await
    }

    /// Archived (soft-deleted) databases, optionally restricted to one owner.
    pub async fn list_archived_databases(
        &self,
        owner_id: Option<i64>,
    ) -> Result<Vec<DatabaseRecord>, StoreError> {
        self.list_databases_where("deleted_at IS NOT NULL", owner_id).await
    }

    async fn list_databases_where(
        &self,
        filter: &str,
        owner_id: Option<i64>,
    ) -> Result<Vec<DatabaseRecord>, StoreError> {
        let sql = format!(
            "SELECT {DATABASE_COLUMNS} FROM databases \
             WHERE {filter} AND (?1 IS NULL OR owner_id = ?1) ORDER BY name"
        );
        Ok(sqlx::query_as::<_, DatabaseRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Any database with this id, archived or not.
    pub async fn find_database(&self, id: i64) -> Result<Option<DatabaseRecord>, StoreError> {
        let sql = format!("SELECT {DATABASE_COLUMNS} FROM databases WHERE id = ?");
        Ok(sqlx::query_as::<_, DatabaseRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Any database with this name, archived or not.
    pub async fn find_database_by_name(
        &self,
        name: &str,
    ) -> Result<Option<DatabaseRecord>, StoreError> {
        let sql = format!("SELECT {DATABASE_COLUMNS} FROM databases WHERE name = ?");
        Ok(sqlx::query_as::<_, DatabaseRecord>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Mark an active database as archived. Returns false if there was none.
    pub async fn archive_database(&self, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE databases SET deleted_at = ? WHERE name = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bring an archived database back. Returns false if none was archived.
    pub async fn restore_database(&self, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE databases SET deleted_at = NULL WHERE name = ? AND deleted_at IS NOT NULL",
        )
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a database, its token records and stats.
    /// Returns false if no such database exists.
    pub async fn force_delete_database(&self, name: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id: Option<(i64,)> = sqlx::query_as("SELECT id FROM databases WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        let Some((id,)) = id else {
            return Ok(false);
        };

        let tokens = sqlx::query("DELETE FROM access_tokens WHERE database_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM database_stats WHERE database_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM databases WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(database = %name, removed_tokens = tokens, "force deleted database");
        Ok(true)
    }
}
