//! Per-database stats, one row per time bucket.

use crate::{StatsRecord, StatsSample, Store, StoreError};
use chrono::{DateTime, Utc};
use sqlx::types::Json;

const STATS_COLUMNS: &str = "database_id, bucket_start, rows_read, rows_written, storage_bytes, \
     write_requests_delegated, replication_index, query_count, top_queries, slowest_queries, \
     fetched_at";

/// Start (unix seconds) of the bucket containing `at`.
pub fn bucket_start(at: DateTime<Utc>, bucket_secs: u64) -> i64 {
    let width = i64::try_from(bucket_secs.max(1)).unwrap_or(i64::MAX);
    at.timestamp().div_euclid(width) * width
}

impl Store {
    /// Write a sample into its bucket, replacing any earlier sample there.
    pub async fn upsert_stats(
        &self,
        database_id: i64,
        bucket_start: i64,
        sample: &StatsSample,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO database_stats (database_id, bucket_start, rows_read, rows_written, \
             storage_bytes, write_requests_delegated, replication_index, query_count, \
             top_queries, slowest_queries, fetched_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (database_id, bucket_start) DO UPDATE SET \
             rows_read = excluded.rows_read, \
             rows_written = excluded.rows_written, \
             storage_bytes = excluded.storage_bytes, \
             write_requests_delegated = excluded.write_requests_delegated, \
             replication_index = excluded.replication_index, \
             query_count = excluded.query_count, \
             top_queries = excluded.top_queries, \
             slowest_queries = excluded.slowest_queries, \
             fetched_at = excluded.fetched_at",
        )
        .bind(database_id)
        .bind(bucket_start)
        .bind(sample.rows_read)
        .bind(sample.rows_written)
        .bind(sample.storage_bytes)
        .bind(sample.write_requests_delegated)
        .bind(sample.replication_index)
        .bind(sample.query_count)
        .bind(Json(&sample.top_queries))
        .bind(Json(&sample.slowest_queries))
        .bind(fetched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent bucket for a database.
    pub async fn latest_stats(&self, database_id: i64) -> Result<Option<StatsRecord>, StoreError> {
        Ok(self.stats_history(database_id, 1).await?.into_iter().next())
    }

    /// Up to `limit` buckets, newest first.
    pub async fn stats_history(
        &self,
        database_id: i64,
        limit: u32,
    ) -> Result<Vec<StatsRecord>, StoreError> {
        let sql = format!(
            "SELECT {STATS_COLUMNS} FROM database_stats WHERE database_id = ? \
             ORDER BY bucket_start DESC LIMIT ?"
        );
        Ok(sqlx::query_as::<_, StatsRecord>(&sql)
            .bind(database_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?)
    }
}
