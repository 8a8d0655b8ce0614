use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::StatvaultError;
use crate::provision::WaitPolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvisioningConfig {
    /// Seconds between availability polls after a database creation request.
    /// TOML: `provisioning.poll_interval_secs`. Default: `5`. Must be > 0.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum cumulative wait before giving up on a new database.
    /// TOML: `provisioning.wait_ceiling_secs`. Default: `30`.
    #[serde(default = "default_wait_ceiling_secs")]
    pub wait_ceiling_secs: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            wait_ceiling_secs: default_wait_ceiling_secs(),
        }
    }
}

impl ProvisioningConfig {
    pub fn wait_policy(&self) -> Result<WaitPolicy, StatvaultError> {
        WaitPolicy::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.wait_ceiling_secs),
        )
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_wait_ceiling_secs() -> u64 {
    30
}
