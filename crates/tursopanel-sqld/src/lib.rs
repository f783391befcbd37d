//! # tursopanel-sqld
//!
//! HTTP clients for the processes running next to the panel:
//!
//! - [`SqldClient`]: `GET /v1/namespaces/{db}/stats` on the database server
//! - [`BridgeClient`]: `GET /api/databases` on the bridge, authenticated with
//!   `Authorization: realm=<password>`
//!
//! and [`StatsRefresher`], the periodic job storing stats per time bucket.
//!
//! Requests use the fixed timeouts from configuration and are never retried.
//! A non-2xx answer surfaces as [`UpstreamError::Status`] with the upstream
//! status and body untouched.

pub mod bridge;
pub mod error;
mod http;
pub mod refresher;
pub mod sqld;

pub use bridge::{BridgeClient, BridgeDatabase};
pub use error::{RefreshError, UpstreamError};
pub use refresher::{RefreshSummary, StatsRefresher};
pub use sqld::{NamespaceStats, SlowQuery, SqldClient, TopQuery};
