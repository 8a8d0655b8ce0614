use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::StatvaultError;
use crate::provision::ResourceDescriptor;
use crate::store::{ConnectParams, Identifier};

/// Connection settings for the MySQL server and the database to provision.
#[derive(Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Server host name or address (required).
    /// TOML: `store.host`.
    #[serde(default)]
    pub host: String,

    /// TOML: `store.port`. Default: `3306`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// TOML: `store.username` (required).
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub username: String,

    /// TOML: `store.password`. Prefer `STATVAULT_STORE__PASSWORD`.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub password: String,

    /// Database to provision.
    /// TOML: `store.database`. Default: `helldivers_stats`.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            database: default_database(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), StatvaultError> {
        if self.host.trim().is_empty() {
            return Err(StatvaultError::InvalidConfig(
                "store.host must be set and non-empty".to_string(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(StatvaultError::InvalidConfig(
                "store.username must be set and non-empty".to_string(),
            ));
        }
        Identifier::new(self.database.as_str())?;
        Ok(())
    }

    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn descriptor(&self) -> Result<ResourceDescriptor, StatvaultError> {
        Ok(ResourceDescriptor {
            name: Identifier::new(self.database.as_str())?,
            params: self.connect_params(),
        })
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for store credentials",
        )),
    }
}

fn default_port() -> u16 {
    3306
}

fn default_database() -> String {
    "helldivers_stats".to_string()
}
