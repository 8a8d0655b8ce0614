use serde::Serialize;
use tracing::info;

use super::catalog::create_resource_statement;
use super::existence::ExistenceChecker;
use crate::error::StatvaultError;
use crate::store::{DataStore, Identifier, execute_once};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// A creation request was issued; visibility is not yet confirmed.
    Created,
    AlreadyExists,
}

/// Issues `CREATE DATABASE` only when the catalog says the database is absent.
pub struct ResourceCreator<'a> {
    store: &'a dyn DataStore,
    checker: ExistenceChecker<'a>,
}

impl<'a> ResourceCreator<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self {
            store,
            checker: ExistenceChecker::new(store),
        }
    }

    pub async fn create_resource_if_missing(
        &self,
        name: &Identifier,
    ) -> Result<ResourceStatus, StatvaultError> {
        if self.checker.resource_exists(name).await? {
            info!(database = %name, "database already exists; skipping creation");
            return Ok(ResourceStatus::AlreadyExists);
        }

        execute_once(self.store, None, &create_resource_statement(name), &[])
            .await
            .map_err(|e| StatvaultError::from_store(e, format!("creating database `{name}`")))?;

        info!(database = %name, "database creation requested");
        Ok(ResourceStatus::Created)
    }
}
