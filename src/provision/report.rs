use serde::Serialize;
use std::time::Duration;

use super::ProvisioningState;
use super::creator::ResourceStatus;
use super::sync::SubResourceOutcome;
use super::waiter::WaitPhase;
use crate::error::{IsRetryable, StatvaultError, serialize_optional_display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    PartialFailure,
    Fatal,
}

/// Result record of one provisioning call.
///
/// Table failures are listed but never turn into `Fatal`; only database-level
/// errors (connection, catalog, timeout) do.
#[derive(Debug, Serialize)]
pub struct ProvisionReport {
    pub resource: String,
    pub outcome: Outcome,
    pub resource_status: Option<ResourceStatus>,
    pub wait_phase: WaitPhase,
    pub polls: u32,
    pub waited: Duration,
    pub sub_resources: Vec<SubResourceOutcome>,
    pub failed_sub_resources: Vec<String>,
    #[serde(serialize_with = "serialize_optional_display")]
    pub error: Option<StatvaultError>,
    /// Set when `error` is transient and rerunning may succeed.
    pub retryable: bool,
}

impl ProvisionReport {
    pub(crate) fn new(
        resource: String,
        resource_status: Option<ResourceStatus>,
        state: &ProvisioningState,
        sub_resources: Vec<SubResourceOutcome>,
        error: Option<StatvaultError>,
    ) -> Self {
        let failed_sub_resources: Vec<String> = sub_resources
            .iter()
            .filter(|outcome| outcome.is_failed())
            .map(|outcome| outcome.name.clone())
            .collect();

        let outcome = match (&error, failed_sub_resources.is_empty()) {
            (Some(_), _) => Outcome::Fatal,
            (None, true) => Outcome::Success,
            (None, false) => Outcome::PartialFailure,
        };

        let retryable = error.as_ref().is_some_and(IsRetryable::is_retryable);

        Self {
            resource,
            outcome,
            resource_status,
            wait_phase: state.phase,
            polls: state.polls,
            waited: state.elapsed_wait,
            sub_resources,
            failed_sub_resources,
            error,
            retryable,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Names of tables that were created by this call.
    pub fn created(&self) -> Vec<&str> {
        self.sub_resources
            .iter()
            .filter(|outcome| matches!(outcome.status, super::SubResourceStatus::Created))
            .map(|outcome| outcome.name.as_str())
            .collect()
    }
}
