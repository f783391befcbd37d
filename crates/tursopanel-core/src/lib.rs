//! Configuration shared across the tursopanel crates.
//!
//! A single YAML file (`tursopanel.yaml` by convention) is deserialized into
//! [`PanelConfig`]. Every section has defaults, so an empty file is a valid
//! development configuration apart from the signing key.

pub mod config;

pub use config::{
    AuthConfig, BridgeConfig, ConfigError, EphemeralKeyPolicy, PanelConfig, SeedUser,
    ServerConfig, SigningConfig, SqldConfig, StatsConfig, StorageConfig,
};
