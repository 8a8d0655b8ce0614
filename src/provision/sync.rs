use serde::Serialize;
use tracing::{info, warn};

use super::SubResourceSpec;
use super::existence::ExistenceChecker;
use crate::error::{StatvaultError, StoreError, serialize_display};
use crate::store::{DataStore, Identifier, execute_once};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubResourceStatus {
    Created,
    AlreadyPresent,
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: StatvaultError,
    },
}

#[derive(Debug, Serialize)]
pub struct SubResourceOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: SubResourceStatus,
}

impl SubResourceOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, SubResourceStatus::Failed { .. })
    }
}

/// Creates missing tables in caller order, continuing past per-table failures.
///
/// Only connection failures stop the loop; they are returned as `Err` and the
/// outcomes gathered so far stay in `outcomes`.
pub struct SubResourceSynchronizer<'a> {
    store: &'a dyn DataStore,
    checker: ExistenceChecker<'a>,
}

impl<'a> SubResourceSynchronizer<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self {
            store,
            checker: ExistenceChecker::new(store),
        }
    }

    pub async fn synchronize(
        &self,
        resource: &Identifier,
        specs: &[SubResourceSpec],
        outcomes: &mut Vec<SubResourceOutcome>,
    ) -> Result<(), StatvaultError> {
        for spec in specs {
            let status = self.synchronize_one(resource, spec).await?;
            outcomes.push(SubResourceOutcome {
                name: spec.name.to_string(),
                status,
            });
        }
        Ok(())
    }

    async fn synchronize_one(
        &self,
        resource: &Identifier,
        spec: &SubResourceSpec,
    ) -> Result<SubResourceStatus, StatvaultError> {
        match self.checker.sub_resource_exists(resource, &spec.name).await {
            Ok(true) => {
                info!(database = %resource, table = %spec.name, "table already present");
                return Ok(SubResourceStatus::AlreadyPresent);
            }
            Ok(false) => {}
            Err(error) if error.is_connection() => return Err(error),
            Err(error) => {
                warn!(database = %resource, table = %spec.name, error = %error, "table check failed");
                return Ok(SubResourceStatus::Failed { error });
            }
        }

        match execute_once(self.store, Some(resource), &spec.ddl, &[]).await {
            Ok(_) => {
                info!(database = %resource, table = %spec.name, "table created");
                Ok(SubResourceStatus::Created)
            }
            Err(StoreError::Statement(source)) => {
                let error = StatvaultError::SubResourceCreation {
                    resource: resource.to_string(),
                    name: spec.name.to_string(),
                    source,
                };
                warn!(database = %resource, table = %spec.name, error = %error, "table creation failed");
                Ok(SubResourceStatus::Failed { error })
            }
            Err(err) => Err(StatvaultError::from_store(
                err,
                format!("creating table `{}`", spec.name),
            )),
        }
    }
}
