use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::models::Record;
use crate::error::{StatvaultError, StoreError};
use crate::provision::catalog::{COLUMNS_OF_TABLE_SQL, TABLES_IN_RESOURCE_SQL};
use crate::store::{DataStore, ExecOutcome, Identifier, Row, Value, execute_once};

/// Column names plus row values, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Row-level helpers for the tables of one database.
///
/// Every call opens a connection scoped to the database, runs its statement(s)
/// and closes the connection before returning.
pub struct TableClient<'a> {
    store: &'a dyn DataStore,
    database: Identifier,
}

impl<'a> TableClient<'a> {
    pub fn new(store: &'a dyn DataStore, database: Identifier) -> Self {
        Self { store, database }
    }

    pub fn database(&self) -> &Identifier {
        &self.database
    }

    pub async fn insert_row(
        &self,
        table: &str,
        columns: &[(&str, Value)],
    ) -> Result<u64, StatvaultError> {
        let table = Identifier::new(table)?;
        let names = quoted_columns(columns)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            table.quoted(),
            names.join(", ")
        );
        let params: Vec<Value> = columns.iter().map(|(_, value)| value.clone()).collect();

        let affected = self.execute(&sql, &params).await?.rows_affected();
        info!(database = %self.database, table = %table, affected, "row inserted");
        Ok(affected)
    }

    pub async fn insert_record<R: Record>(&self, record: &R) -> Result<u64, StatvaultError> {
        self.insert_row(R::TABLE, &record.columns()).await
    }

    pub async fn read_row(&self, table: &str, id: i64) -> Result<Option<Row>, StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("SELECT * FROM {} WHERE id = ?", table.quoted());
        let row = self.execute(&sql, &[Value::Int(id)]).await?.into_rows().into_iter().next();
        if row.is_none() {
            debug!(database = %self.database, table = %table, id, "row not found");
        }
        Ok(row)
    }

    pub async fn read_row_as<T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
    ) -> Result<Option<T>, StatvaultError> {
        self.read_row(table, id)
            .await?
            .map(|row| row.decode())
            .transpose()
    }

    pub async fn read_record<R: Record>(&self, id: i64) -> Result<Option<R>, StatvaultError> {
        self.read_row_as(R::TABLE, id).await
    }

    pub async fn read_table(&self, table: &str) -> Result<Vec<Row>, StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("SELECT * FROM {}", table.quoted());
        Ok(self.execute(&sql, &[]).await?.into_rows())
    }

    /// All rows with the column header, which is known even for empty tables.
    pub async fn table_data(&self, table: &str) -> Result<TableData, StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("SELECT * FROM {}", table.quoted());
        self.select_with_columns(&table, &sql, &[]).await
    }

    pub async fn data_by_id(&self, table: &str, id: i64) -> Result<TableData, StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("SELECT * FROM {} WHERE id = ?", table.quoted());
        self.select_with_columns(&table, &sql, &[Value::Int(id)])
            .await
    }

    pub async fn update_cell(
        &self,
        table: &str,
        column: &str,
        id: i64,
        value: Value,
    ) -> Result<u64, StatvaultError> {
        self.update_row(table, id, &[(column, value)]).await
    }

    /// Update several columns of one row in a single statement.
    pub async fn update_row(
        &self,
        table: &str,
        id: i64,
        columns: &[(&str, Value)],
    ) -> Result<u64, StatvaultError> {
        let table = Identifier::new(table)?;
        if columns.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<String> = quoted_columns(columns)?
            .into_iter()
            .map(|column| format!("{column} = ?"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table.quoted(),
            assignments.join(", ")
        );
        let mut params: Vec<Value> = columns.iter().map(|(_, value)| value.clone()).collect();
        params.push(Value::Int(id));

        let affected = self.execute(&sql, &params).await?.rows_affected();
        info!(database = %self.database, table = %table, id, affected, "row updated");
        Ok(affected)
    }

    pub async fn delete_row(&self, table: &str, id: i64) -> Result<u64, StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("DELETE FROM {} WHERE id = ?", table.quoted());
        let affected = self.execute(&sql, &[Value::Int(id)]).await?.rows_affected();
        info!(database = %self.database, table = %table, id, affected, "row deleted");
        Ok(affected)
    }

    pub async fn delete_table(&self, table: &str) -> Result<(), StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("DROP TABLE IF EXISTS {}", table.quoted());
        self.execute(&sql, &[]).await?;
        info!(database = %self.database, table = %table, "table dropped");
        Ok(())
    }

    /// Drop every base table of this database and return the dropped names.
    pub async fn delete_all_tables(&self) -> Result<Vec<String>, StatvaultError> {
        let tables = self.table_names().await?;
        for table in &tables {
            self.delete_table(table).await?;
        }
        Ok(tables)
    }

    /// Base tables of this database only; other schemas on the server are ignored.
    pub async fn table_names(&self) -> Result<Vec<String>, StatvaultError> {
        let rows = self
            .execute(
                TABLES_IN_RESOURCE_SQL,
                &[Value::from(self.database.as_str())],
            )
            .await?
            .into_rows();
        Ok(rows
            .iter()
            .filter_map(|row| row.get("TABLE_NAME").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect())
    }

    /// Highest `id` in the table, `None` when the table is empty.
    pub async fn last_id(&self, table: &str) -> Result<Option<i64>, StatvaultError> {
        let table = Identifier::new(table)?;
        let sql = format!("SELECT id FROM {} ORDER BY id DESC LIMIT 1", table.quoted());
        Ok(self
            .execute(&sql, &[])
            .await?
            .into_rows()
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_i64))
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, StatvaultError> {
        execute_once(self.store, Some(&self.database), sql, params)
            .await
            .map_err(|e| StatvaultError::from_store(e, format!("running `{sql}`")))
    }

    async fn select_with_columns(
        &self,
        table: &Identifier,
        sql: &str,
        params: &[Value],
    ) -> Result<TableData, StatvaultError> {
        let mut conn = self
            .store
            .connect(Some(&self.database))
            .await
            .map_err(|e| StatvaultError::from_store(e, format!("reading `{table}`")))?;

        let fetched = async {
            let header = conn
                .execute(
                    COLUMNS_OF_TABLE_SQL,
                    &[
                        Value::from(self.database.as_str()),
                        Value::from(table.as_str()),
                    ],
                )
                .await?
                .into_rows();
            let rows = conn.execute(sql, params).await?.into_rows();
            Ok::<_, StoreError>((header, rows))
        }
        .await;
        conn.close().await;
        let (header, rows) =
            fetched.map_err(|e| StatvaultError::from_store(e, format!("reading `{table}`")))?;

        let columns = header
            .iter()
            .filter_map(|row| row.get("COLUMN_NAME").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect();
        Ok(TableData {
            columns,
            rows: rows.into_iter().map(Row::into_values).collect(),
        })
    }
}

fn quoted_columns(columns: &[(&str, Value)]) -> Result<Vec<String>, StatvaultError> {
    columns
        .iter()
        .map(|(name, _)| Identifier::new(*name).map(|id| id.quoted()))
        .collect()
}
