//! Data store seam: the SQL-executing collaborator every other module talks to.
//!
//! Layout:
//! - `ident.rs`: validated SQL identifiers
//! - `value.rs`: scalar values, rows and statement outcomes
//! - `mysql.rs`: the sqlx-backed MySQL implementation

pub mod ident;
pub mod mysql;
pub mod value;

pub use ident::Identifier;
pub use mysql::MySqlStore;
pub use value::{ExecOutcome, Row, Value};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::StoreError;

/// Where and as whom to connect.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ConnectParams {
    pub fn server(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opens connections, optionally scoped to one database.
///
/// A `None` scope yields a server-level connection with no database selected,
/// which is what catalog queries run on.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// `host:port` style label for logs and errors.
    fn server(&self) -> String;

    async fn connect(
        &self,
        scope: Option<&Identifier>,
    ) -> Result<Box<dyn StoreConnection>, StoreError>;
}

#[async_trait]
pub trait StoreConnection: Send {
    async fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> Result<ExecOutcome, StoreError>;

    async fn close(self: Box<Self>);
}

/// Run one statement on a connection of its own, closing it on every path.
pub async fn execute_once(
    store: &dyn DataStore,
    scope: Option<&Identifier>,
    statement: &str,
    params: &[Value],
) -> Result<ExecOutcome, StoreError> {
    let mut conn = store.connect(scope).await?;
    let result = conn.execute(statement, params).await;
    conn.close().await;

    debug!(
        server = %store.server(),
        database = scope.map_or("<none>", Identifier::as_str),
        ok = result.is_ok(),
        "statement executed"
    );
    result
}
