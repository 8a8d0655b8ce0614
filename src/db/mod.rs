//! Database module: the statistics schema, typed rows and row helpers.
//!
//! Layout:
//! - `schema.rs`: `CREATE TABLE` builders and the four statistics tables
//! - `models.rs`: Rust structs mirroring table rows
//! - `tables.rs`: CRUD helpers over a [`DataStore`](crate::store::DataStore)

pub mod models;
pub mod schema;
pub mod tables;

pub use models::{Combat, CurrencyGained, ObjectivesCompleted, Record, SamplesGained};
pub use schema::{TableSchema, game_stats_tables};
pub use tables::{TableClient, TableData};
