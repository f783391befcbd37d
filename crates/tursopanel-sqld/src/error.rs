use thiserror::Error;
use tursopanel_store::StoreError;

/// Errors talking to sqld or the bridge.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream could not be reached or the request timed out.
    #[error("upstream unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status. Status and body are kept
    /// verbatim so they can be passed through to API callers.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid upstream URL '{0}'")]
    InvalidUrl(String),

    #[error("unexpected upstream response: {0}")]
    Decode(String),
}

/// Errors from a stats refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("database '{0}' not found")]
    UnknownDatabase(String),
}
