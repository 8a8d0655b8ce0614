use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ProvisioningState;
use super::existence::ExistenceChecker;
use crate::error::StatvaultError;
use crate::store::{DataStore, Identifier};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WAIT_CEILING: Duration = Duration::from_secs(30);

/// Fixed-interval polling bounds for a freshly requested database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    interval: Duration,
    ceiling: Duration,
}

impl WaitPolicy {
    pub fn new(interval: Duration, ceiling: Duration) -> Result<Self, StatvaultError> {
        if interval.is_zero() {
            return Err(StatvaultError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { interval, ceiling })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            ceiling: DEFAULT_WAIT_CEILING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitPhase {
    /// No creation request was issued, so there was nothing to wait for.
    #[default]
    Idle,
    Requested,
    Polling,
    Available,
    TimedOut,
}

/// Polls the catalog until a requested database shows up or the ceiling is hit.
///
/// The first poll happens one interval after the request. The elapsed-time
/// check runs before every sleep and the last sleep is clamped, so the total
/// wait never exceeds the ceiling. Each poll opens and closes its own
/// connection.
pub struct AvailabilityWaiter<'a> {
    checker: ExistenceChecker<'a>,
    policy: WaitPolicy,
}

impl<'a> AvailabilityWaiter<'a> {
    pub fn new(store: &'a dyn DataStore, policy: WaitPolicy) -> Self {
        Self {
            checker: ExistenceChecker::new(store),
            policy,
        }
    }

    pub async fn wait_until_available(
        &self,
        name: &Identifier,
        state: &mut ProvisioningState,
    ) -> Result<(), StatvaultError> {
        state.phase = WaitPhase::Requested;

        loop {
            let remaining = self.policy.ceiling.saturating_sub(state.elapsed_wait);
            if remaining.is_zero() {
                state.phase = WaitPhase::TimedOut;
                warn!(
                    database = %name,
                    polls = state.polls,
                    waited = ?state.elapsed_wait,
                    "database did not become visible before the wait ceiling"
                );
                return Err(StatvaultError::ProvisioningTimeout {
                    resource: name.to_string(),
                    waited: state.elapsed_wait,
                    polls: state.polls,
                });
            }

            let pause = remaining.min(self.policy.interval);
            tokio::time::sleep(pause).await;
            state.elapsed_wait += pause;
            state.phase = WaitPhase::Polling;
            state.polls += 1;

            if self.checker.resource_exists(name).await? {
                state.phase = WaitPhase::Available;
                state.confirmed_existing = true;
                info!(
                    database = %name,
                    polls = state.polls,
                    waited = ?state.elapsed_wait,
                    "database is available"
                );
                return Ok(());
            }

            debug!(
                database = %name,
                poll = state.polls,
                waited = ?state.elapsed_wait,
                "database not visible yet"
            );
        }
    }
}
