//! Idempotent provisioning of one database and its tables.
//!
//! Flow: check the database (`existence`), request it when missing
//! (`creator`), wait for it to become visible (`waiter`), then create the
//! missing tables one by one (`sync`). The outcome is a [`ProvisionReport`].
//!
//! Concurrent calls for the same database are not serialized: two
//! provisioners may both see "missing" and both issue a creation request.

pub mod catalog;
pub mod creator;
pub mod existence;
pub mod report;
pub mod sync;
pub mod waiter;

pub use catalog::list_databases_and_tables;
pub use creator::{ResourceCreator, ResourceStatus};
pub use existence::ExistenceChecker;
pub use report::{Outcome, ProvisionReport};
pub use sync::{SubResourceOutcome, SubResourceStatus, SubResourceSynchronizer};
pub use waiter::{AvailabilityWaiter, WaitPhase, WaitPolicy};

use std::time::Duration;
use tracing::{error, info};

use crate::error::StatvaultError;
use crate::store::{ConnectParams, DataStore, Identifier, MySqlStore};

/// Identifies the database to provision and how to reach its server.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub name: Identifier,
    pub params: ConnectParams,
}

/// One table and the DDL that creates it. The DDL must be self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubResourceSpec {
    pub name: Identifier,
    pub ddl: String,
}

impl SubResourceSpec {
    pub fn new(name: &str, ddl: impl Into<String>) -> Result<Self, StatvaultError> {
        Ok(Self {
            name: Identifier::new(name)?,
            ddl: ddl.into(),
        })
    }
}

/// Per-call bookkeeping; never shared between calls.
#[derive(Debug, Clone, Default)]
pub struct ProvisioningState {
    pub requested: bool,
    pub confirmed_existing: bool,
    pub elapsed_wait: Duration,
    pub polls: u32,
    pub phase: WaitPhase,
}

pub struct Provisioner<'a> {
    store: &'a dyn DataStore,
    policy: WaitPolicy,
}

impl<'a> Provisioner<'a> {
    pub fn new(store: &'a dyn DataStore, policy: WaitPolicy) -> Self {
        Self { store, policy }
    }

    /// Ensure `resource` and every table in `specs` exist.
    ///
    /// Never returns early with an error: fatal conditions end up in
    /// [`ProvisionReport::error`] with [`Outcome::Fatal`].
    pub async fn provision(
        &self,
        resource: &Identifier,
        specs: &[SubResourceSpec],
    ) -> ProvisionReport {
        let mut state = ProvisioningState::default();
        let mut outcomes = Vec::with_capacity(specs.len());
        info!(
            server = %self.store.server(),
            database = %resource,
            tables = specs.len(),
            "provisioning started"
        );

        let resource_status = match self.ensure_resource(resource, &mut state).await {
            Ok(status) => status,
            Err(err) => {
                error!(database = %resource, error = %err, "provisioning aborted");
                return ProvisionReport::new(
                    resource.to_string(),
                    None,
                    &state,
                    outcomes,
                    Some(err),
                );
            }
        };

        let synchronizer = SubResourceSynchronizer::new(self.store);
        let fatal = synchronizer
            .synchronize(resource, specs, &mut outcomes)
            .await
            .err();
        if let Some(err) = &fatal {
            error!(database = %resource, error = %err, "provisioning aborted while creating tables");
        }

        let report = ProvisionReport::new(
            resource.to_string(),
            Some(resource_status),
            &state,
            outcomes,
            fatal,
        );
        info!(
            database = %resource,
            outcome = ?report.outcome,
            failed = report.failed_sub_resources.len(),
            "provisioning finished"
        );
        report
    }

    async fn ensure_resource(
        &self,
        resource: &Identifier,
        state: &mut ProvisioningState,
    ) -> Result<ResourceStatus, StatvaultError> {
        let status = ResourceCreator::new(self.store)
            .create_resource_if_missing(resource)
            .await?;

        match status {
            ResourceStatus::AlreadyExists => state.confirmed_existing = true,
            ResourceStatus::Created => {
                state.requested = true;
                AvailabilityWaiter::new(self.store, self.policy)
                    .wait_until_available(resource, state)
                    .await?;
            }
        }
        Ok(status)
    }
}

/// Provision `descriptor` on its MySQL server.
pub async fn provision(
    descriptor: &ResourceDescriptor,
    specs: &[SubResourceSpec],
    policy: WaitPolicy,
) -> ProvisionReport {
    let store = MySqlStore::new(descriptor.params.clone());
    Provisioner::new(&store, policy)
        .provision(&descriptor.name, specs)
        .await
}
