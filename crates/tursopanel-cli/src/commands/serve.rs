//! Serve command for starting the admin API.
//!
//! `tursopanel serve` - Open the store, load the signing key, start the
//! background jobs and serve the CLI-facing API until Ctrl-C.

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};
use tursopanel_core::PanelConfig;
use tursopanel_dashboard::{AppState, DashboardServer};
use tursopanel_sqld::{SqldClient, StatsRefresher};
use tursopanel_store::Store;
use tursopanel_token::load_signing_key;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

pub async fn serve(config_path: PathBuf) -> anyhow::Result<()> {
    let config = PanelConfig::load_with_context(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    info!(
        config = %config_path.display(),
        project = config.project.as_deref().unwrap_or("tursopanel"),
        "Loading configuration"
    );

    let store = Store::open(&config.storage)
        .await
        .with_context(|| format!("Failed to open store at {}", config.storage.path.display()))?;
    store
        .bootstrap_users(&config.auth)
        .await
        .context("Failed to seed users")?;

    let (keypair, origin) =
        load_signing_key(&config.signing).context("Failed to load signing key")?;
    if origin.is_ephemeral() {
        warn!(?origin, "Tokens minted by this process die with it");
    }

    if config.stats.enabled {
        let sqld = SqldClient::new(&config.sqld)?;
        StatsRefresher::new(store.clone(), sqld, config.stats.bucket_secs)
            .spawn(Duration::from_secs(config.stats.interval_secs));
        info!(every_secs = config.stats.interval_secs, "Stats refresh scheduled");
    }
    spawn_session_purge(store.clone());

    let state = AppState::new(config, store, keypair)?;
    DashboardServer::new(state).run().await?;
    Ok(())
}

/// Drop expired CLI sessions every hour.
fn spawn_session_purge(store: Store) {
    tokio::spawn(async move {
        let mut interval = time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match store.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired CLI sessions"),
                Err(e) => tracing::error!("session purge failed: {}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_serve_refuses_without_signing_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tursopanel.yaml");
        let yaml = "storage:\n  path: data/panel.sqlite\n\
                    auth:\n  admin_password: hunter22\n\
                    stats:\n  enabled: false\n";
        fs::write(&path, yaml).unwrap();

        let err = serve(path).await.unwrap_err();
        assert!(format!("{err:#}").contains("signing"));
        // The store was still created and seeded before the key check.
        assert!(dir.path().join("data/panel.sqlite").exists());
    }

    #[tokio::test]
    async fn test_serve_reports_missing_config() {
        let dir = tempdir().unwrap();
        let err = serve(dir.path().join("missing.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
