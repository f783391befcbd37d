//! Stats commands.
//!
//! `tursopanel stats refresh` - Run one stats sweep outside the server.

use anyhow::Context;
use std::path::PathBuf;
use tursopanel_core::PanelConfig;
use tursopanel_sqld::{SqldClient, StatsRefresher};
use tursopanel_store::Store;

pub async fn refresh(config_path: PathBuf, database: Option<String>) -> anyhow::Result<()> {
    let config = PanelConfig::load_with_context(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    let store = Store::open(&config.storage)
        .await
        .with_context(|| format!("Failed to open store at {}", config.storage.path.display()))?;

    let sqld = SqldClient::new(&config.sqld)?;
    let refresher = StatsRefresher::new(store, sqld, config.stats.bucket_secs);

    match database {
        Some(name) => {
            let record = refresher
                .refresh_one(&name)
                .await
                .with_context(|| format!("Failed to refresh stats for {name}"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        None => {
            let summary = refresher.refresh_all().await?;
            println!("✔ Refreshed {} database(s)", summary.refreshed);
            if !summary.failed.is_empty() {
                println!("✖ Failed: {}", summary.failed.join(", "));
                anyhow::bail!("{} database(s) could not be refreshed", summary.failed.len());
            }
        }
    }

    Ok(())
}
