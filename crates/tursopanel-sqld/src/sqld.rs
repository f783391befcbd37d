//! Client for the sqld admin stats endpoint.

use crate::error::UpstreamError;
use crate::http::{build_client, check_status, endpoint, parse_base_url};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tursopanel_core::SqldConfig;
use tursopanel_store::StatsSample;

/// Body of `GET /v1/namespaces/{db}/stats`. Unknown fields are ignored and
/// missing counters default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceStats {
    pub rows_read_count: u64,
    pub rows_written_count: u64,
    pub storage_bytes_used: u64,
    pub write_requests_delegated: u64,
    pub replication_index: Option<u64>,
    pub query_count: u64,
    pub top_queries: Vec<TopQuery>,
    pub slowest_queries: Vec<SlowQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopQuery {
    pub query: String,
    pub rows_read: u64,
    pub rows_written: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowQuery {
    pub query: String,
    pub elapsed_ms: u64,
    pub rows_read: u64,
    pub rows_written: u64,
}

impl NamespaceStats {
    /// Convert to the stored representation.
    pub fn to_sample(&self) -> StatsSample {
        StatsSample {
            rows_read: saturate(self.rows_read_count),
            rows_written: saturate(self.rows_written_count),
            storage_bytes: saturate(self.storage_bytes_used),
            write_requests_delegated: saturate(self.write_requests_delegated),
            replication_index: saturate(self.replication_index.unwrap_or_default()),
            query_count: saturate(self.query_count),
            top_queries: serde_json::to_value(&self.top_queries).unwrap_or_default(),
            slowest_queries: serde_json::to_value(&self.slowest_queries).unwrap_or_default(),
        }
    }
}

fn saturate(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone)]
pub struct SqldClient {
    http: Client,
    base_url: Url,
}

impl SqldClient {
    pub fn new(config: &SqldConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: build_client(config.timeout_ms)?,
            base_url: parse_base_url(&config.url)?,
        })
    }

    pub async fn namespace_stats(&self, namespace: &str) -> Result<NamespaceStats, UpstreamError> {
        let url = endpoint(&self.base_url, &["v1", "namespaces", namespace, "stats"])?;
        tracing::debug!(%url, "fetching namespace stats");

        let response = check_status(self.http.get(url).send().await?).await?;
        response
            .json::<NamespaceStats>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SqldClient {
        SqldClient::new(&SqldConfig {
            url: server.uri(),
            timeout_ms: 2000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_namespace_stats_parses_counters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaces/orders/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ignored",
                "rows_read_count": 120,
                "rows_written_count": 7,
                "storage_bytes_used": 8192,
                "write_requests_delegated": 0,
                "replication_index": null,
                "query_count": 33,
                "top_queries": [{"query": "SELECT * FROM t", "rows_read": 100, "rows_written": 0}],
                "slowest_queries": [{
                    "query": "SELECT * FROM t",
                    "elapsed_ms": 12,
                    "rows_read": 100,
                    "rows_written": 0
                }]
            })))
            .mount(&server)
            .await;

        let stats = client(&server).namespace_stats("orders").await.unwrap();
        assert_eq!(stats.rows_read_count, 120);
        assert_eq!(stats.replication_index, None);
        assert_eq!(stats.top_queries[0].rows_read, 100);
        assert_eq!(stats.slowest_queries[0].elapsed_ms, 12);

        let sample = stats.to_sample();
        assert_eq!(sample.storage_bytes, 8192);
        assert_eq!(sample.top_queries[0]["query"], "SELECT * FROM t");
    }

    #[tokio::test]
    async fn test_non_success_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaces/ghost/stats"))
            .respond_with(ResponseTemplate::new(404).set_body_string("namespace ghost not found"))
            .mount(&server)
            .await;

        let err = client(&server).namespace_stats("ghost").await.unwrap_err();
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "namespace ghost not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable() {
        let sqld = SqldClient::new(&SqldConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 500,
        })
        .unwrap();
        let err = sqld.namespace_stats("orders").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unreachable(_)));
    }
}
