//! Background job: pull namespace stats from sqld into the store.
//!
//! Each sweep writes into the current time bucket with an upsert, so a
//! retried or overlapping sweep replaces the bucket's row instead of adding
//! another one.

use crate::error::RefreshError;
use crate::sqld::SqldClient;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tursopanel_store::{StatsRecord, Store, bucket_start};

/// Outcome of a full sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub refreshed: usize,
    /// Names of databases whose fetch or write failed.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StatsRefresher {
    store: Store,
    sqld: SqldClient,
    bucket_secs: u64,
}

impl StatsRefresher {
    pub fn new(store: Store, sqld: SqldClient, bucket_secs: u64) -> Self {
        Self {
            store,
            sqld,
            bucket_secs,
        }
    }

    /// Refresh every active database. A failing database is logged and
    /// skipped; the sweep carries on.
    pub async fn refresh_all(&self) -> Result<RefreshSummary, RefreshError> {
        let databases = self.store.list_databases(None).await?;
        let mut summary = RefreshSummary::default();

        for db in databases {
            match self.refresh_one(&db.name).await {
                Ok(_) => summary.refreshed += 1,
                Err(e) => {
                    tracing::warn!(database = %db.name, error = %e, "stats refresh failed");
                    summary.failed.push(db.name);
                }
            }
        }

        tracing::info!(
            refreshed = summary.refreshed,
            failed = summary.failed.len(),
            "stats sweep finished"
        );
        Ok(summary)
    }

    /// Refresh one active database and return the stored bucket.
    pub async fn refresh_one(&self, name: &str) -> Result<StatsRecord, RefreshError> {
        let db = self
            .store
            .find_database_by_name(name)
            .await?
            .filter(|db| !db.is_archived())
            .ok_or_else(|| RefreshError::UnknownDatabase(name.to_string()))?;

        let stats = self.sqld.namespace_stats(&db.name).await?;
        let now = Utc::now();
        let bucket = bucket_start(now, self.bucket_secs);

        self.store
            .upsert_stats(db.id, bucket, &stats.to_sample(), now)
            .await?;

        self.store
            .latest_stats(db.id)
            .await?
            .ok_or_else(|| RefreshError::UnknownDatabase(name.to_string()))
    }

    /// Spawn the periodic sweep. Call this once at startup.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(every);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh_all().await {
                    tracing::error!("stats job failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tursopanel_core::SqldConfig;
    use tursopanel_store::NewDatabase;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (Store, StatsRefresher) {
        let store = Store::open_in_memory().await.unwrap();
        let owner = store.create_user("alice", "pw", false).await.unwrap();
        for name in ["orders", "broken"] {
            store
                .create_database(&NewDatabase {
                    name: name.to_string(),
                    owner_id: owner.id,
                    group_id: None,
                    is_schema: false,
                    schema_name: None,
                })
                .await
                .unwrap();
        }

        let sqld = SqldClient::new(&SqldConfig {
            url: server.uri(),
            timeout_ms: 2000,
        })
        .unwrap();
        (store.clone(), StatsRefresher::new(store, sqld, 3600))
    }

    async fn mount_stats(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/namespaces/orders/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows_read_count": 10,
                "rows_written_count": 2,
                "query_count": 4
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaces/broken/stats"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_refresh_all_skips_failures() {
        let server = MockServer::start().await;
        mount_stats(&server).await;
        let (_, refresher) = setup(&server).await;

        let summary = refresher.refresh_all().await.unwrap();
        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, vec!["broken".to_string()]);
    }

    #[tokio::test]
    async fn test_rerun_within_bucket_does_not_duplicate() {
        let server = MockServer::start().await;
        mount_stats(&server).await;
        let (store, refresher) = setup(&server).await;

        let first = refresher.refresh_one("orders").await.unwrap();
        let second = refresher.refresh_one("orders").await.unwrap();
        assert_eq!(first.rows_read, 10);

        let history = store.stats_history(second.database_id, 10).await.unwrap();
        // A bucket boundary may fall between the two calls.
        assert!(history.len() <= 2);
        if first.bucket_start == second.bucket_start {
            assert_eq!(history.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_unknown_database() {
        let server = MockServer::start().await;
        let (_, refresher) = setup(&server).await;

        let err = refresher.refresh_one("ghost").await.unwrap_err();
        assert!(matches!(err, RefreshError::UnknownDatabase(_)));
    }
}
