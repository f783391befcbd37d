//! Users: seeding, bootstrap and credential checks.

use crate::{Store, StoreError, UserRecord};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tursopanel_core::AuthConfig;

const USER_COLUMNS: &str = "id, username, password_hash, is_admin, created_at";

impl Store {
    /// Create a user with an Argon2-hashed password.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<UserRecord, StoreError> {
        let hash = hash_password(password)?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, is_admin, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(&hash)
        .bind(is_admin)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::conflict_on_unique(e, "user", username))?
        .last_insert_rowid();

        Ok(UserRecord {
            id,
            username: username.to_string(),
            password_hash: hash,
            is_admin,
            created_at: now,
        })
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn count_users(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(1) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Returns the user when the password matches. Unknown users and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let Some(user) = self.find_user_by_username(username).await? else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Create configured seed users that do not exist yet, then, if the
    /// store still has no users, create `admin` from the bootstrap password.
    pub async fn bootstrap_users(&self, auth: &AuthConfig) -> Result<(), StoreError> {
        for seed in &auth.users {
            if self.find_user_by_username(&seed.username).await?.is_some() {
                continue;
            }
            let Some(password) = seed.get_password().filter(|p| !p.is_empty()) else {
                tracing::warn!(username = %seed.username, "seed user has no password, skipping");
                continue;
            };
            self.create_user(&seed.username, &password, seed.admin).await?;
            tracing::info!(username = %seed.username, admin = seed.admin, "seeded user");
        }

        if self.count_users().await? > 0 {
            return Ok(());
        }

        let password = auth.resolve_admin_password().ok_or_else(|| {
            StoreError::Config(format!(
                "no users configured and bootstrap admin password is empty \
                 (set {} or auth.admin_password)",
                auth.admin_password_env
            ))
        })?;
        self.create_user("admin", &password, true).await?;

        tracing::warn!("bootstrapped user 'admin' (password taken from env/config)");
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, phc: &str) -> Result<bool, StoreError> {
    let parsed = PasswordHash::new(phc).map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tursopanel_core::SeedUser;

    fn auth_with(users: Vec<SeedUser>, admin_password: Option<&str>) -> AuthConfig {
        AuthConfig {
            users,
            admin_password_env: "TURSOPANEL_TEST_UNSET_ADMIN_PASSWORD".to_string(),
            admin_password: admin_password.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let store = Store::open_in_memory().await.unwrap();
        store.create_user("alice", "wonderland", false).await.unwrap();

        let user = store.verify_credentials("alice", "wonderland").await.unwrap();
        assert_eq!(user.unwrap().username, "alice");
        assert!(store.verify_credentials("alice", "nope").await.unwrap().is_none());
        assert!(store.verify_credentials("bob", "wonderland").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let store = Store::open_in_memory().await.unwrap();
        let user = store.create_user("alice", "wonderland", false).await.unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(!user.password_hash.contains("wonderland"));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = Store::open_in_memory().await.unwrap();
        store.create_user("alice", "a", false).await.unwrap();
        let err = store.create_user("alice", "b", false).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: "user", .. }));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_when_empty() {
        let store = Store::open_in_memory().await.unwrap();
        store.bootstrap_users(&auth_with(vec![], Some("s3cret"))).await.unwrap();

        let admin = store.verify_credentials("admin", "s3cret").await.unwrap().unwrap();
        assert!(admin.is_admin);

        // Second run is a no-op.
        store.bootstrap_users(&auth_with(vec![], Some("other"))).await.unwrap();
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_without_password_fails() {
        let store = Store::open_in_memory().await.unwrap();
        let err = store.bootstrap_users(&auth_with(vec![], None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn test_seed_users_skip_admin_bootstrap() {
        let store = Store::open_in_memory().await.unwrap();
        let seeds = vec![
            SeedUser {
                username: "ops".to_string(),
                password: Some("pw".to_string()),
                password_env: None,
                admin: true,
            },
            SeedUser {
                username: "nopass".to_string(),
                password: None,
                password_env: None,
                admin: false,
            },
        ];
        store.bootstrap_users(&auth_with(seeds, None)).await.unwrap();

        assert!(store.find_user_by_username("ops").await.unwrap().unwrap().is_admin);
        assert!(store.find_user_by_username("nopass").await.unwrap().is_none());
        assert!(store.find_user_by_username("admin").await.unwrap().is_none());
    }
}
