use statvault::db::{CurrencyGained, TableClient, TableData};
use statvault::provision::list_databases_and_tables;
use statvault::store::{ExecOutcome, Identifier, Row, Value};
use statvault::testing::MemoryStore;

fn client(store: &MemoryStore) -> TableClient<'_> {
    TableClient::new(store, Identifier::new("stats").expect("valid identifier"))
}

#[tokio::test]
async fn insert_row_binds_values_in_column_order() {
    let store = MemoryStore::new().with_database("stats");
    store.push_response(ExecOutcome::RowsAffected(1));

    let affected = client(&store)
        .insert_row(
            "currency_gained",
            &[("requisition", Value::Int(1500)), ("medals", Value::Int(12))],
        )
        .await
        .expect("insert succeeds");

    assert_eq!(affected, 1);
    let executed = store.executed();
    let insert = executed.last().expect("statement recorded");
    assert_eq!(insert.scope.as_deref(), Some("stats"));
    assert_eq!(
        insert.sql,
        "INSERT INTO `currency_gained` (`requisition`, `medals`) VALUES (?, ?)"
    );
    assert_eq!(insert.params, vec![Value::Int(1500), Value::Int(12)]);
}

#[tokio::test]
async fn bad_column_name_is_rejected_before_reaching_the_store() {
    let store = MemoryStore::new().with_database("stats");

    let err = client(&store)
        .insert_row("combat", &[("kills; DROP TABLE combat", Value::Int(1))])
        .await
        .expect_err("column name must be validated");

    assert!(matches!(err, statvault::StatvaultError::InvalidIdentifier(_)));
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn read_record_decodes_scripted_row() {
    let store = MemoryStore::new().with_database("stats");
    store.push_response(ExecOutcome::Rows(vec![
        Row::new()
            .with("id", 7_i64)
            .with("requisition", 900_i64)
            .with("medals", Value::Null)
            .with("xp", 350_i64),
    ]));

    let record: CurrencyGained = client(&store)
        .read_record(7)
        .await
        .expect("read succeeds")
        .expect("row exists");

    assert_eq!(
        record,
        CurrencyGained {
            id: Some(7),
            requisition: Some(900),
            medals: None,
            xp: Some(350),
        }
    );
    let executed = store.executed();
    assert_eq!(executed[0].sql, "SELECT * FROM `currency_gained` WHERE id = ?");
    assert_eq!(executed[0].params, vec![Value::Int(7)]);
}

#[tokio::test]
async fn missing_row_reads_as_none() {
    let store = MemoryStore::new().with_database("stats");
    store.push_response(ExecOutcome::Rows(Vec::new()));

    let row = client(&store)
        .read_row("combat", 42)
        .await
        .expect("read succeeds");
    assert!(row.is_none());
}

#[tokio::test]
async fn table_data_carries_header_for_empty_table() {
    let store = MemoryStore::new().with_database("stats");
    store.push_response(ExecOutcome::Rows(vec![
        Row::new().with("COLUMN_NAME", "id"),
        Row::new().with("COLUMN_NAME", "green_samples"),
    ]));
    store.push_response(ExecOutcome::Rows(Vec::new()));

    let data = client(&store)
        .table_data("samples_gained")
        .await
        .expect("read succeeds");

    assert_eq!(
        data,
        TableData {
            columns: vec!["id".to_string(), "green_samples".to_string()],
            rows: Vec::new(),
        }
    );
    // header and rows share one connection
    assert_eq!(store.connections_opened(), 1);
    assert_eq!(store.connections_closed(), 1);
}

#[tokio::test]
async fn update_row_sets_every_column_in_one_statement() {
    let store = MemoryStore::new().with_database("stats");
    store.push_response(ExecOutcome::RowsAffected(1));

    let affected = client(&store)
        .update_row(
            "combat",
            3,
            &[("kills", Value::Int(250)), ("deaths", Value::Int(2))],
        )
        .await
        .expect("update succeeds");

    assert_eq!(affected, 1);
    let executed = store.executed();
    assert_eq!(
        executed[0].sql,
        "UPDATE `combat` SET `kills` = ?, `deaths` = ? WHERE id = ?"
    );
    assert_eq!(
        executed[0].params,
        vec![Value::Int(250), Value::Int(2), Value::Int(3)]
    );
}

#[tokio::test]
async fn last_id_of_empty_table_is_none() {
    let store = MemoryStore::new().with_database("stats");
    store.push_response(ExecOutcome::Rows(Vec::new()));
    store.push_response(ExecOutcome::Rows(vec![Row::new().with("id", 19_i64)]));

    let client = client(&store);
    assert_eq!(client.last_id("combat").await.expect("query succeeds"), None);
    assert_eq!(
        client.last_id("combat").await.expect("query succeeds"),
        Some(19)
    );
}

#[tokio::test]
async fn delete_all_tables_only_touches_own_database() {
    let store = MemoryStore::new()
        .with_table("stats", "combat")
        .with_table("stats", "xp_log")
        .with_table("other", "combat");

    let dropped = client(&store)
        .delete_all_tables()
        .await
        .expect("drop succeeds");

    assert_eq!(dropped, vec!["combat".to_string(), "xp_log".to_string()]);
    assert!(store.tables("stats").is_empty());
    assert_eq!(store.tables("other"), vec!["combat".to_string()]);
}

#[tokio::test]
async fn unknown_database_fails_to_connect() {
    let store = MemoryStore::new();

    let err = client(&store)
        .read_table("combat")
        .await
        .expect_err("database does not exist");
    assert!(matches!(err, statvault::StatvaultError::Connection { .. }));
}

#[tokio::test]
async fn catalog_listing_groups_tables_by_database() {
    let store = MemoryStore::new()
        .with_table("stats", "combat")
        .with_table("stats", "samples_gained")
        .with_database("empty")
        .with_pending_database("hidden", None);

    let listing = list_databases_and_tables(&store)
        .await
        .expect("listing succeeds");

    assert_eq!(listing.len(), 2);
    assert_eq!(
        listing["stats"],
        vec!["combat".to_string(), "samples_gained".to_string()]
    );
    assert!(listing["empty"].is_empty());
    assert_eq!(store.connections_opened(), 1);
}
