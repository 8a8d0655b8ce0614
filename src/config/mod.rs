mod basic;
mod provisioning;
mod store;

pub use basic::BasicConfig;
pub use provisioning::ProvisioningConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::StatvaultError;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Logging (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Target server and database (see `store` table in config.toml).
    #[serde(default)]
    pub store: StoreConfig,

    /// Availability polling bounds (see `provisioning` table in config.toml).
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "STATVAULT_";

impl Config {
    /// Builds a Figment that merges defaults, `config.toml` if present, then
    /// `STATVAULT_`-prefixed environment variables (`__` separates tables, e.g.
    /// `STATVAULT_STORE__HOST`).
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates the configuration.
    pub fn load() -> Result<Self, StatvaultError> {
        let cfg: Self = Self::figment().extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), StatvaultError> {
        self.store.validate()?;
        self.provisioning.wait_policy()?;
        Ok(())
    }
}
