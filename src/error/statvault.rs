use std::time::Duration;

use thiserror::Error as ThisError;

use super::IsRetryable;
use super::store::StoreError;

#[derive(Debug, ThisError)]
pub enum StatvaultError {
    #[error("Connection error ({server}): {source}")]
    Connection {
        server: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Store unavailable while {context}: {source}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database `{resource}` not visible after {waited:?} ({polls} polls)")]
    ProvisioningTimeout {
        resource: String,
        waited: Duration,
        polls: u32,
    },

    #[error("Failed to create table `{name}` in `{resource}`: {source}")]
    SubResourceCreation {
        resource: String,
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl StatvaultError {
    /// Map a store failure, naming the operation that hit it.
    pub(crate) fn from_store(err: StoreError, context: impl Into<String>) -> Self {
        match err {
            StoreError::Connect { server, source } => StatvaultError::Connection { server, source },
            StoreError::Statement(source) => StatvaultError::StoreUnavailable {
                context: context.into(),
                source,
            },
        }
    }

    /// Connection-class errors abort a provisioning run.
    pub fn is_connection(&self) -> bool {
        matches!(self, StatvaultError::Connection { .. })
    }
}

impl From<StoreError> for StatvaultError {
    fn from(err: StoreError) -> Self {
        StatvaultError::from_store(err, "executing statement")
    }
}

impl From<figment::Error> for StatvaultError {
    fn from(err: figment::Error) -> Self {
        StatvaultError::ConfigError(Box::new(err))
    }
}

/// A later run may succeed without operator action: the server was unreachable
/// or a catalog query failed. Timeouts and invalid input are not retryable.
impl IsRetryable for StatvaultError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            StatvaultError::Connection { .. } | StatvaultError::StoreUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_class() {
        let connect = StoreError::Connect {
            server: "db:3306".to_string(),
            source: sqlx::Error::Protocol("refused".to_string()),
        };
        let mapped = StatvaultError::from_store(connect, "checking database");
        assert!(mapped.is_connection());
        assert!(mapped.is_retryable());

        let statement = StoreError::Statement(sqlx::Error::Protocol("gone away".to_string()));
        match StatvaultError::from_store(statement, "checking database `stats`") {
            StatvaultError::StoreUnavailable { context, .. } => {
                assert_eq!(context, "checking database `stats`");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timeout_is_not_retryable() {
        let err = StatvaultError::ProvisioningTimeout {
            resource: "stats".to_string(),
            waited: Duration::from_secs(30),
            polls: 6,
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("6 polls"));
    }
}
