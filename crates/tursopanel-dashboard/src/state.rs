//! Dashboard application state.

use crate::error::DashboardError;
use std::sync::Arc;
use tursopanel_core::PanelConfig;
use tursopanel_sqld::{BridgeClient, SqldClient, StatsRefresher};
use tursopanel_store::Store;
use tursopanel_token::{KeyPair, KeyRing, TokenMinter, TokenVerifier};

/// Shared application state for the dashboard.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PanelConfig,
    store: Store,
    minter: TokenMinter,
    /// Active public key plus retired ones still accepted.
    key_ring: KeyRing,
    verifier: TokenVerifier,
    bridge: BridgeClient,
    refresher: StatsRefresher,
}

impl AppState {
    /// Create a new application state around an opened store and the
    /// service signing key.
    pub fn new(
        config: PanelConfig,
        store: Store,
        keypair: KeyPair,
    ) -> Result<Self, DashboardError> {
        let key_ring = KeyRing::new(keypair.public_key())
            .with_previous_hex(&config.signing.previous_public_keys)?;
        let verifier = TokenVerifier::new(key_ring.clone());

        let sqld = SqldClient::new(&config.sqld)?;
        let bridge = BridgeClient::new(&config.bridge)?;
        let refresher = StatsRefresher::new(store.clone(), sqld, config.stats.bucket_secs);

        tracing::info!(
            kid = %key_ring.active_kid(),
            published_keys = key_ring.len(),
            "dashboard state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                minter: TokenMinter::new(keypair),
                key_ring,
                verifier,
                bridge,
                refresher,
            }),
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn minter(&self) -> &TokenMinter {
        &self.inner.minter
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.inner.key_ring
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    pub fn bridge(&self) -> &BridgeClient {
        &self.inner.bridge
    }

    pub fn refresher(&self) -> &StatsRefresher {
        &self.inner.refresher
    }
}
