//! Shared plumbing for the upstream clients.

use crate::error::UpstreamError;
use reqwest::{Client, Response, Url};
use std::time::Duration;

pub(crate) fn build_client(timeout_ms: u64) -> Result<Client, UpstreamError> {
    Ok(Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}

pub(crate) fn parse_base_url(base: &str) -> Result<Url, UpstreamError> {
    let url = Url::parse(base).map_err(|_| UpstreamError::InvalidUrl(base.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(UpstreamError::InvalidUrl(base.to_string()));
    }
    Ok(url)
}

/// `base` with `segments` appended, each percent-encoded as a path segment.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UpstreamError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx response into [`UpstreamError::Status`].
pub(crate) async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let base = parse_base_url("http://127.0.0.1:8081/").unwrap();
        let url = endpoint(&base, &["v1", "namespaces", "a b", "stats"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8081/v1/namespaces/a%20b/stats");

        let prefixed = parse_base_url("http://host/admin").unwrap();
        let url = endpoint(&prefixed, &["api", "databases"]).unwrap();
        assert_eq!(url.as_str(), "http://host/admin/api/databases");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }
}
