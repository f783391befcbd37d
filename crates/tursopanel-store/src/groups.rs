//! Database groups. Membership is the `group_id` column on `databases`.

use crate::{GroupDeletion, GroupRecord, Store, StoreError};
use chrono::Utc;

const GROUP_COLUMNS: &str = "id, name, owner_id, created_at";

impl Store {
    /// Create a group and attach the named active databases to it, atomically.
    /// Fails with `NotFound` (and creates nothing) if any member is missing.
    pub async fn create_group(
        &self,
        name: &str,
        owner_id: i64,
        members: &[String],
    ) -> Result<GroupRecord, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO database_groups (name, owner_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::conflict_on_unique(e, "group", name))?
        .last_insert_rowid();

        for member in members {
            let attached = sqlx::query(
                "UPDATE databases SET group_id = ? WHERE name = ? AND deleted_at IS NULL",
            )
            .bind(id)
            .bind(member)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if attached == 0 {
                return Err(StoreError::NotFound {
                    kind: "database",
                    name: member.clone(),
                });
            }
        }

        tx.commit().await?;
        tracing::info!(group = %name, members = members.len(), "created group");

        Ok(GroupRecord {
            id,
            name: name.to_string(),
            owner_id,
            created_at: now,
        })
    }

    pub async fn list_groups(&self, owner_id: Option<i64>) -> Result<Vec<GroupRecord>, StoreError> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM database_groups \
             WHERE (?1 IS NULL OR owner_id = ?1) ORDER BY name"
        );
        Ok(sqlx::query_as::<_, GroupRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn find_group(&self, id: i64) -> Result<Option<GroupRecord>, StoreError> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM database_groups WHERE id = ?");
        Ok(sqlx::query_as::<_, GroupRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_group_by_name(&self, name: &str) -> Result<Option<GroupRecord>, StoreError> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM database_groups WHERE name = ?");
        Ok(sqlx::query_as::<_, GroupRecord>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Names of the active databases in a group.
    pub async fn group_members(&self, group_id: i64) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM databases WHERE group_id = ? AND deleted_at IS NULL ORDER BY name",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Delete a group: token records scoped to it or granted to it are
    /// removed and its databases detached, in one transaction. Returns `None`
    /// if there is no such group.
    pub async fn delete_group(&self, name: &str) -> Result<Option<GroupDeletion>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id: Option<(i64,)> = sqlx::query_as("SELECT id FROM database_groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        let Some((id,)) = id else {
            return Ok(None);
        };

        let removed_tokens =
            sqlx::query("DELETE FROM access_tokens WHERE group_id = ?1 OR grantee_team_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        let detached_databases =
            sqlx::query("UPDATE databases SET group_id = NULL WHERE group_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        sqlx::query("DELETE FROM database_groups WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(
            group = %name,
            detached_databases,
            removed_tokens,
            "deleted group"
        );

        Ok(Some(GroupDeletion {
            detached_databases,
            removed_tokens,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{new_database, seeded};
    use crate::{GroupDeletion, NewToken, StoreError};
    use chrono::Utc;
    use tursopanel_token::Grantee;

    #[tokio::test]
    async fn test_create_group_attaches_members() {
        let (store, alice, _) = seeded().await;
        store.create_database(&new_database("orders", alice.id)).await.unwrap();
        store.create_database(&new_database("invoices", alice.id)).await.unwrap();

        let group = store
            .create_group("sales", alice.id, &["orders".to_string(), "invoices".to_string()])
            .await
            .unwrap();

        assert_eq!(store.group_members(group.id).await.unwrap(), vec!["invoices", "orders"]);
        let orders = store.find_database_by_name("orders").await.unwrap().unwrap();
        assert_eq!(orders.group_id, Some(group.id));
    }

    #[tokio::test]
    async fn test_create_group_with_missing_member_rolls_back() {
        let (store, alice, _) = seeded().await;
        store.create_database(&new_database("orders", alice.id)).await.unwrap();

        let err = store
            .create_group("sales", alice.id, &["orders".to_string(), "ghost".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "database", .. }));

        assert!(store.find_group_by_name("sales").await.unwrap().is_none());
        let orders = store.find_database_by_name("orders").await.unwrap().unwrap();
        assert_eq!(orders.group_id, None);
    }

    #[tokio::test]
    async fn test_delete_group_detaches_and_removes_tokens() {
        let (store, alice, _) = seeded().await;
        store.create_database(&new_database("orders", alice.id)).await.unwrap();
        let group = store
            .create_group("sales", alice.id, &["orders".to_string()])
            .await
            .unwrap();
        store
            .insert_token(&NewToken {
                name: "sales".to_string(),
                full_access_token: "full".to_string(),
                read_only_token: "ro".to_string(),
                expiration_days: 0,
                expires_at: Utc::now(),
                grantee: Grantee::Group(4),
                database_id: None,
                group_id: Some(group.id),
                created_by: alice.id,
            })
            .await
            .unwrap();

        let deletion = store.delete_group("sales").await.unwrap().unwrap();
        assert_eq!(
            deletion,
            GroupDeletion {
                detached_databases: 1,
                removed_tokens: 1
            }
        );
        assert!(store.find_group(group.id).await.unwrap().is_none());
        assert!(store.list_tokens(None).await.unwrap().is_empty());
        let orders = store.find_database_by_name("orders").await.unwrap().unwrap();
        assert_eq!(orders.group_id, None);

        assert!(store.delete_group("sales").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_group_removes_tokens_granted_to_it() {
        let (store, alice, _) = seeded().await;
        let orders = store.create_database(&new_database("orders", alice.id)).await.unwrap();
        let team = store.create_group("team", alice.id, &[]).await.unwrap();
        store
            .insert_token(&NewToken {
                name: "orders".to_string(),
                full_access_token: "full".to_string(),
                read_only_token: "ro".to_string(),
                expiration_days: 30,
                expires_at: Utc::now(),
                grantee: Grantee::Group(team.id as u64),
                database_id: Some(orders.id),
                group_id: None,
                created_by: alice.id,
            })
            .await
            .unwrap();

        let deletion = store.delete_group("team").await.unwrap().unwrap();
        assert_eq!(deletion.removed_tokens, 1);
        assert_eq!(deletion.detached_databases, 0);
        assert!(store.list_tokens(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_groups_by_owner() {
        let (store, alice, root) = seeded().await;
        store.create_group("a", alice.id, &[]).await.unwrap();
        store.create_group("b", root.id, &[]).await.unwrap();

        assert_eq!(store.list_groups(Some(alice.id)).await.unwrap().len(), 1);
        assert_eq!(store.list_groups(None).await.unwrap().len(), 2);
    }
}
