use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, Executor, Row as _, TypeInfo, ValueRef};
use tracing::{debug, warn};

use super::{ConnectParams, DataStore, ExecOutcome, Identifier, Row, StoreConnection, Value};
use crate::error::StoreError;

/// MySQL-family store backed by single sqlx connections (no pool).
#[derive(Debug, Clone)]
pub struct MySqlStore {
    params: ConnectParams,
}

impl MySqlStore {
    pub fn new(params: ConnectParams) -> Self {
        Self { params }
    }

    fn options(&self, scope: Option<&Identifier>) -> MySqlConnectOptions {
        let opts = MySqlConnectOptions::new()
            .host(&self.params.host)
            .port(self.params.port)
            .username(&self.params.username)
            .password(&self.params.password);
        match scope {
            Some(database) => opts.database(database.as_str()),
            None => opts,
        }
    }
}

#[async_trait]
impl DataStore for MySqlStore {
    fn server(&self) -> String {
        self.params.server()
    }

    async fn connect(
        &self,
        scope: Option<&Identifier>,
    ) -> Result<Box<dyn StoreConnection>, StoreError> {
        let conn = self
            .options(scope)
            .connect()
            .await
            .map_err(|source| StoreError::Connect {
                server: self.server(),
                source,
            })?;

        debug!(
            server = %self.server(),
            database = scope.map_or("<none>", Identifier::as_str),
            "store connection opened"
        );
        Ok(Box::new(MySqlStoreConnection { conn }))
    }
}

struct MySqlStoreConnection {
    conn: MySqlConnection,
}

#[async_trait]
impl StoreConnection for MySqlStoreConnection {
    async fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> Result<ExecOutcome, StoreError> {
        // Parameterless statements go over the text protocol so DDL is never prepared.
        if returns_rows(statement) {
            let rows = if params.is_empty() {
                (&mut self.conn).fetch_all(statement).await?
            } else {
                bind_all(sqlx::query(statement), params)
                    .fetch_all(&mut self.conn)
                    .await?
            };
            let rows = rows
                .iter()
                .map(decode_row)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ExecOutcome::Rows(rows))
        } else {
            let done = if params.is_empty() {
                (&mut self.conn).execute(statement).await?
            } else {
                bind_all(sqlx::query(statement), params)
                    .execute(&mut self.conn)
                    .await?
            };
            Ok(ExecOutcome::RowsAffected(done.rows_affected()))
        }
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "store connection did not close cleanly");
        }
    }
}

fn returns_rows(statement: &str) -> bool {
    let keyword: String = leading_code(statement)
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    matches!(
        keyword.to_ascii_uppercase().as_str(),
        "SELECT" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" | "WITH" | "TABLE" | "VALUES"
    )
}

/// Statement text after leading whitespace, `(`, and comments.
fn leading_code(mut rest: &str) -> &str {
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(body) = rest.strip_prefix("/*") {
            rest = body.find("*/").map_or("", |end| &body[end + 2..]);
        } else if let Some(body) = rest.strip_prefix("--").or_else(|| rest.strip_prefix('#')) {
            rest = body.find('\n').map_or("", |end| &body[end + 1..]);
        } else {
            return rest;
        }
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::UInt(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Bytes(v) => query.bind(v.clone()),
        };
    }
    query
}

fn decode_row(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, index, column.type_info().name())?;
        out.push(column.name(), value);
    }
    Ok(out)
}

fn decode_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Value::Int(row.try_get(index)?),
        "YEAR" => Value::UInt(u64::from(row.try_get_unchecked::<u16, _>(index)?)),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::UInt(row.try_get(index)?),
        "FLOAT" => Value::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => Value::Float(row.try_get(index)?),
        "DECIMAL" => {
            let text: String = row.try_get_unchecked(index)?;
            match text.parse::<f64>() {
                Ok(number) => Value::Float(number),
                Err(_) => Value::Text(text),
            }
        }
        "DATE" => Value::Text(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "DATETIME" => Value::Text(row.try_get::<NaiveDateTime, _>(index)?.to_string()),
        "TIMESTAMP" => Value::Text(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339()),
        "TIME" => Value::Text(row.try_get::<MySqlTime, _>(index)?.to_string()),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Value::Bytes(row.try_get(index)?)
        }
        _ => Value::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}
