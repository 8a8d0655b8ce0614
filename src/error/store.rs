use thiserror::Error as ThisError;

/// Failure reported by a [`DataStore`](crate::store::DataStore) implementation.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Failed to connect to {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Statement failed: {0}")]
    Statement(#[from] sqlx::Error),
}
