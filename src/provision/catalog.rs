//! Catalog statements, all answered by `INFORMATION_SCHEMA` so they work on a
//! server-scoped connection with no database selected.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{StatvaultError, StoreError};
use crate::store::{DataStore, Identifier, Value};

pub const RESOURCE_EXISTS_SQL: &str =
    "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?";

pub const SUB_RESOURCE_EXISTS_SQL: &str = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

pub const LIST_RESOURCES_SQL: &str =
    "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA ORDER BY SCHEMA_NAME";

pub const LIST_SUB_RESOURCES_SQL: &str = "SELECT TABLE_SCHEMA, TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_SCHEMA, TABLE_NAME";

pub const TABLES_IN_RESOURCE_SQL: &str = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";

pub const COLUMNS_OF_TABLE_SQL: &str = "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";

pub fn create_resource_statement(name: &Identifier) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", name.quoted())
}

/// Every database on the server with its base tables, empty databases included.
///
/// Both catalog queries share one server-scoped connection.
pub async fn list_databases_and_tables(
    store: &dyn DataStore,
) -> Result<BTreeMap<String, Vec<String>>, StatvaultError> {
    let context = "listing databases and tables";
    let mut conn = store
        .connect(None)
        .await
        .map_err(|e| StatvaultError::from_store(e, context))?;

    let listed = async {
        let databases = conn.execute(LIST_RESOURCES_SQL, &[]).await?.into_rows();
        let tables = conn.execute(LIST_SUB_RESOURCES_SQL, &[]).await?.into_rows();
        Ok::<_, StoreError>((databases, tables))
    }
    .await;
    conn.close().await;
    let (databases, tables) = listed.map_err(|e| StatvaultError::from_store(e, context))?;

    let mut catalog: BTreeMap<String, Vec<String>> = databases
        .iter()
        .filter_map(|row| row.get("SCHEMA_NAME").and_then(Value::as_str))
        .map(|name| (name.to_string(), Vec::new()))
        .collect();

    for row in &tables {
        let schema = row.get("TABLE_SCHEMA").and_then(Value::as_str);
        let table = row.get("TABLE_NAME").and_then(Value::as_str);
        if let (Some(schema), Some(table)) = (schema, table) {
            catalog
                .entry(schema.to_string())
                .or_default()
                .push(table.to_string());
        }
    }

    debug!(databases = catalog.len(), "catalog listed");
    Ok(catalog)
}
