//! Client for the bridge process, which lists provisioned database
//! directories behind a shared secret.

use crate::error::UpstreamError;
use crate::http::{build_client, check_status, endpoint, parse_base_url};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tursopanel_core::BridgeConfig;

/// A provisioned database directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeDatabase {
    pub name: String,
    /// Whatever else the bridge reported about it.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawObject {
    name: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Name(String),
    Object(RawObject),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Bare(Vec<RawEntry>),
    Wrapped { databases: Vec<RawEntry> },
}

impl From<RawEntry> for BridgeDatabase {
    fn from(entry: RawEntry) -> Self {
        match entry {
            RawEntry::Name(name) => BridgeDatabase {
                name,
                details: Map::new(),
            },
            RawEntry::Object(RawObject { name, details }) => BridgeDatabase { name, details },
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: Client,
    base_url: Url,
    password: Option<String>,
}

impl BridgeClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: build_client(config.timeout_ms)?,
            base_url: parse_base_url(&config.url)?,
            password: config.resolve_password(),
        })
    }

    /// `GET /api/databases`. Accepts a bare array or `{"databases": [...]}`,
    /// with entries either plain names or objects carrying `name`.
    pub async fn list_databases(&self) -> Result<Vec<BridgeDatabase>, UpstreamError> {
        let url = endpoint(&self.base_url, &["api", "databases"])?;
        let mut request = self.http.get(url);
        if let Some(password) = &self.password {
            request = request.header(AUTHORIZATION, format!("realm={password}"));
        }

        let response = check_status(request.send().await?).await?;
        let listing = response
            .json::<Listing>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let entries = match listing {
            Listing::Bare(entries) | Listing::Wrapped { databases: entries } => entries,
        };
        Ok(entries.into_iter().map(BridgeDatabase::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, password: Option<&str>) -> BridgeClient {
        BridgeClient::new(&BridgeConfig {
            url: server.uri(),
            password: password.map(String::from),
            password_env: None,
            timeout_ms: 2000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_sends_realm_header_and_parses_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/databases"))
            .and(header("authorization", "realm=hunter2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                "orders",
                {"name": "billing", "size": 1024}
            ])))
            .mount(&server)
            .await;

        let dbs = client(&server, Some("hunter2")).list_databases().await.unwrap();
        assert_eq!(dbs.len(), 2);
        assert_eq!(dbs[0].name, "orders");
        assert_eq!(dbs[1].name, "billing");
        assert_eq!(dbs[1].details["size"], 1024);
    }

    #[tokio::test]
    async fn test_parses_wrapped_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/databases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "databases": [{"name": "orders"}]
            })))
            .mount(&server)
            .await;

        let dbs = client(&server, None).list_databases().await.unwrap();
        assert_eq!(dbs, vec![BridgeDatabase {
            name: "orders".to_string(),
            details: Map::new()
        }]);
    }

    #[tokio::test]
    async fn test_wrong_secret_passes_status_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/databases"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad realm"))
            .mount(&server)
            .await;

        let err = client(&server, Some("wrong")).list_databases().await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Status { status: 401, ref body } if body == "bad realm"
        ));
    }
}
