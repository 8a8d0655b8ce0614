//! In-process store double for tests.
//!
//! `MemoryStore` understands the catalog statements from
//! [`crate::provision::catalog`], `CREATE DATABASE`, `CREATE TABLE` and
//! `DROP TABLE`; everything else is answered from a queue of scripted
//! outcomes. Every statement and every connection is recorded so tests can
//! assert on call counts and connection hygiene.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::provision::catalog::{
    LIST_RESOURCES_SQL, LIST_SUB_RESOURCES_SQL, RESOURCE_EXISTS_SQL, SUB_RESOURCE_EXISTS_SQL,
    TABLES_IN_RESOURCE_SQL,
};
use crate::store::{DataStore, ExecOutcome, Identifier, Row, StoreConnection, Value};

const MEMORY_SERVER: &str = "memory";

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub scope: Option<String>,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default)]
enum Visibility {
    #[default]
    Visible,
    /// Becomes visible on the n-th existence check.
    Pending(u32),
    Never,
}

impl From<Option<u32>> for Visibility {
    fn from(checks: Option<u32>) -> Self {
        checks.map_or(Visibility::Never, Visibility::Pending)
    }
}

#[derive(Debug, Default)]
struct Database {
    tables: BTreeSet<String>,
    visibility: Visibility,
}

impl Database {
    fn is_visible(&self) -> bool {
        matches!(self.visibility, Visibility::Visible)
    }

    fn observe(&mut self) -> bool {
        match self.visibility {
            Visibility::Visible => true,
            Visibility::Never => false,
            Visibility::Pending(n) if n <= 1 => {
                self.visibility = Visibility::Visible;
                true
            }
            Visibility::Pending(n) => {
                self.visibility = Visibility::Pending(n - 1);
                false
            }
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    databases: BTreeMap<String, Database>,
    new_database_visibility: Visibility,
    failing_patterns: Vec<String>,
    refuse_connections: bool,
    /// Remaining database-scoped connects before they start failing.
    scoped_connect_budget: Option<u32>,
    responses: VecDeque<ExecOutcome>,
    executed: Vec<ExecutedStatement>,
    resource_checks: u32,
    opened: u32,
    closed: u32,
    open_now: u32,
    max_open: u32,
}

/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_database(self, name: &str) -> Self {
        self.lock().databases.entry(name.to_string()).or_default();
        self
    }

    #[must_use]
    pub fn with_table(self, database: &str, table: &str) -> Self {
        self.lock()
            .databases
            .entry(database.to_string())
            .or_default()
            .tables
            .insert(table.to_string());
        self
    }

    /// A database that exists but only shows up on the n-th existence check
    /// (`None`: never).
    #[must_use]
    pub fn with_pending_database(self, name: &str, visible_after_checks: Option<u32>) -> Self {
        self.lock().databases.insert(
            name.to_string(),
            Database {
                tables: BTreeSet::new(),
                visibility: visible_after_checks.into(),
            },
        );
        self
    }

    /// Visibility of databases created through `CREATE DATABASE` (`None`: never).
    #[must_use]
    pub fn new_databases_visible_after(self, checks: Option<u32>) -> Self {
        self.lock().new_database_visibility = checks.into();
        self
    }

    /// Any statement containing `pattern` fails with a statement error.
    #[must_use]
    pub fn fail_statements_containing(self, pattern: &str) -> Self {
        self.lock().failing_patterns.push(pattern.to_string());
        self
    }

    #[must_use]
    pub fn refuse_connections(self) -> Self {
        self.lock().refuse_connections = true;
        self
    }

    /// Allow `n` database-scoped connects, then refuse every further one.
    /// Server-scoped (catalog) connects are unaffected.
    #[must_use]
    pub fn refuse_scoped_connections_after(self, n: u32) -> Self {
        self.lock().scoped_connect_budget = Some(n);
        self
    }

    /// Queue the outcome for the next statement the store does not interpret.
    pub fn push_response(&self, outcome: ExecOutcome) {
        self.lock().responses.push_back(outcome);
    }

    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.lock().executed.clone()
    }

    /// Number of executed statements starting with `prefix`.
    pub fn count_executed(&self, prefix: &str) -> usize {
        self.lock()
            .executed
            .iter()
            .filter(|stmt| stmt.sql.starts_with(prefix))
            .count()
    }

    pub fn resource_checks(&self) -> u32 {
        self.lock().resource_checks
    }

    pub fn connections_opened(&self) -> u32 {
        self.lock().opened
    }

    pub fn connections_closed(&self) -> u32 {
        self.lock().closed
    }

    pub fn max_open_connections(&self) -> u32 {
        self.lock().max_open
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.lock().databases.contains_key(name)
    }

    pub fn tables(&self, database: &str) -> Vec<String> {
        self.lock()
            .databases
            .get(database)
            .map(|db| db.tables.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    fn server(&self) -> String {
        MEMORY_SERVER.to_string()
    }

    async fn connect(
        &self,
        scope: Option<&Identifier>,
    ) -> Result<Box<dyn StoreConnection>, StoreError> {
        let mut state = self.lock();
        if state.refuse_connections {
            return Err(connect_error("connection refused"));
        }
        if let Some(database) = scope {
            let usable = state
                .databases
                .get(database.as_str())
                .is_some_and(Database::is_visible);
            if !usable {
                return Err(connect_error(&format!("unknown database `{database}`")));
            }
            match state.scoped_connect_budget {
                Some(0) => return Err(connect_error("connection lost")),
                Some(n) => state.scoped_connect_budget = Some(n - 1),
                None => {}
            }
        }

        state.opened += 1;
        state.open_now += 1;
        state.max_open = state.max_open.max(state.open_now);
        drop(state);

        Ok(Box::new(MemoryConnection {
            store: self.clone(),
            scope: scope.map(ToString::to_string),
        }))
    }
}

struct MemoryConnection {
    store: MemoryStore,
    scope: Option<String>,
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> Result<ExecOutcome, StoreError> {
        self.run(statement, params)
    }

    async fn close(self: Box<Self>) {
        let mut state = self.store.lock();
        state.closed += 1;
        state.open_now = state.open_now.saturating_sub(1);
    }
}

impl MemoryConnection {
    fn run(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, StoreError> {
        let mut state = self.store.lock();
        state.executed.push(ExecutedStatement {
            scope: self.scope.clone(),
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        if let Some(pattern) = state
            .failing_patterns
            .iter()
            .find(|pattern| sql.contains(pattern.as_str()))
        {
            return Err(StoreError::Statement(sqlx::Error::Protocol(format!(
                "statement rejected (matched {pattern:?})"
            ))));
        }

        let text_param = |index: usize| {
            params
                .get(index)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let outcome = match sql {
            RESOURCE_EXISTS_SQL => {
                state.resource_checks += 1;
                let name = text_param(0);
                let visible = state
                    .databases
                    .get_mut(&name)
                    .is_some_and(Database::observe);
                rows(visible.then(|| Row::new().with("SCHEMA_NAME", name)))
            }
            SUB_RESOURCE_EXISTS_SQL => {
                let (schema, table) = (text_param(0), text_param(1));
                let present = state
                    .databases
                    .get(&schema)
                    .is_some_and(|db| db.is_visible() && db.tables.contains(&table));
                rows(present.then(|| Row::new().with("TABLE_NAME", table)))
            }
            LIST_RESOURCES_SQL => ExecOutcome::Rows(
                state
                    .databases
                    .iter()
                    .filter(|(_, db)| db.is_visible())
                    .map(|(name, _)| Row::new().with("SCHEMA_NAME", name.as_str()))
                    .collect(),
            ),
            LIST_SUB_RESOURCES_SQL => ExecOutcome::Rows(
                state
                    .databases
                    .iter()
                    .filter(|(_, db)| db.is_visible())
                    .flat_map(|(schema, db)| {
                        db.tables.iter().map(move |table| {
                            Row::new()
                                .with("TABLE_SCHEMA", schema.as_str())
                                .with("TABLE_NAME", table.as_str())
                        })
                    })
                    .collect(),
            ),
            TABLES_IN_RESOURCE_SQL => {
                let schema = text_param(0);
                ExecOutcome::Rows(
                    state
                        .databases
                        .get(&schema)
                        .map(|db| {
                            db.tables
                                .iter()
                                .map(|table| Row::new().with("TABLE_NAME", table.as_str()))
                                .collect()
                        })
                        .unwrap_or_default(),
                )
            }
            _ => {
                if let Some(name) = object_name(sql, "CREATE DATABASE") {
                    let visibility = state.new_database_visibility;
                    state.databases.entry(name).or_insert_with(|| Database {
                        tables: BTreeSet::new(),
                        visibility,
                    });
                    ExecOutcome::RowsAffected(1)
                } else if let Some(name) = object_name(sql, "CREATE TABLE") {
                    let db = self.scoped_database(&mut state)?;
                    db.tables.insert(name);
                    ExecOutcome::RowsAffected(0)
                } else if let Some(name) = object_name(sql, "DROP TABLE") {
                    let db = self.scoped_database(&mut state)?;
                    db.tables.remove(&name);
                    ExecOutcome::RowsAffected(0)
                } else {
                    state
                        .responses
                        .pop_front()
                        .unwrap_or(ExecOutcome::RowsAffected(0))
                }
            }
        };
        Ok(outcome)
    }

    fn scoped_database<'s>(
        &self,
        state: &'s mut MemoryState,
    ) -> Result<&'s mut Database, StoreError> {
        self.scope
            .as_ref()
            .and_then(|name| state.databases.get_mut(name))
            .ok_or_else(|| StoreError::Statement(sqlx::Error::Protocol("no database selected".to_string())))
    }
}

fn rows(row: Option<Row>) -> ExecOutcome {
    ExecOutcome::Rows(row.into_iter().collect())
}

fn connect_error(message: &str) -> StoreError {
    StoreError::Connect {
        server: MEMORY_SERVER.to_string(),
        source: sqlx::Error::Protocol(message.to_string()),
    }
}

/// Object name following `keyword` (and an optional `IF [NOT] EXISTS`).
fn object_name(sql: &str, keyword: &str) -> Option<String> {
    let rest = strip_keyword(sql.trim_start(), keyword)?.trim_start();
    let rest = strip_keyword(rest, "IF NOT EXISTS")
        .or_else(|| strip_keyword(rest, "IF EXISTS"))
        .unwrap_or(rest)
        .trim_start();

    let name: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(' && *c != ';')
        .collect();
    let name = name.trim_matches('`');
    (!name.is_empty()).then(|| name.to_string())
}

fn strip_keyword<'s>(sql: &'s str, keyword: &str) -> Option<&'s str> {
    let head = sql.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &sql[keyword.len()..])
}
