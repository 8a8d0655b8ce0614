use std::time::Duration;

use statvault::StatvaultError;
use statvault::db::game_stats_tables;
use statvault::provision::{
    Outcome, Provisioner, ResourceStatus, SubResourceSpec, SubResourceStatus, WaitPhase,
    WaitPolicy,
};
use statvault::store::Identifier;
use statvault::testing::MemoryStore;

fn db(name: &str) -> Identifier {
    Identifier::new(name).expect("valid identifier")
}

fn spec(name: &str) -> SubResourceSpec {
    SubResourceSpec::new(
        name,
        format!("CREATE TABLE IF NOT EXISTS `{name}` (id INT AUTO_INCREMENT PRIMARY KEY)"),
    )
    .expect("valid table name")
}

#[tokio::test(start_paused = true)]
async fn fresh_server_gets_database_and_all_tables() {
    let store = MemoryStore::new();
    let tables = game_stats_tables().expect("schema is valid");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("helldivers_stats"), &tables)
        .await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.resource_status, Some(ResourceStatus::Created));
    assert_eq!(report.wait_phase, WaitPhase::Available);
    assert_eq!(report.polls, 1);
    assert_eq!(report.waited, Duration::from_secs(5));
    assert_eq!(
        report.created(),
        vec!["objectives_completed", "combat", "samples_gained", "currency_gained"]
    );
    assert_eq!(store.count_executed("CREATE DATABASE"), 1);
    assert_eq!(store.tables("helldivers_stats").len(), 4);
}

#[tokio::test(start_paused = true)]
async fn second_run_issues_no_ddl() {
    let store = MemoryStore::new();
    let tables = game_stats_tables().expect("schema is valid");
    let provisioner = Provisioner::new(&store, WaitPolicy::default());

    let first = provisioner.provision(&db("helldivers_stats"), &tables).await;
    assert!(first.is_success());
    let ddl_after_first = store.count_executed("CREATE");

    let second = provisioner.provision(&db("helldivers_stats"), &tables).await;
    assert!(second.is_success());
    assert_eq!(second.resource_status, Some(ResourceStatus::AlreadyExists));
    assert_eq!(second.wait_phase, WaitPhase::Idle);
    assert_eq!(second.polls, 0);
    assert!(second.created().is_empty());
    assert!(
        second
            .sub_resources
            .iter()
            .all(|outcome| matches!(outcome.status, SubResourceStatus::AlreadyPresent))
    );
    assert_eq!(store.count_executed("CREATE"), ddl_after_first);
}

#[tokio::test(start_paused = true)]
async fn existing_database_is_not_recreated_and_not_awaited() {
    let store = MemoryStore::new().with_database("DBTest1");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("DBTest1"), &[spec("combat")])
        .await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.resource_status, Some(ResourceStatus::AlreadyExists));
    assert_eq!(report.waited, Duration::ZERO);
    assert_eq!(store.count_executed("CREATE DATABASE"), 0);
    assert_eq!(store.resource_checks(), 1);
}

#[tokio::test(start_paused = true)]
async fn existing_table_gets_no_creation_attempt() {
    let store = MemoryStore::new()
        .with_database("stats")
        .with_table("stats", "combat");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("stats"), &[spec("combat"), spec("samples_gained")])
        .await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.created(), vec!["samples_gained"]);
    assert_eq!(store.count_executed("CREATE TABLE IF NOT EXISTS `combat`"), 0);
    assert_eq!(
        store.count_executed("CREATE TABLE IF NOT EXISTS `samples_gained`"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn invisible_database_times_out_after_six_polls() {
    let store = MemoryStore::new().new_databases_visible_after(None);

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("stats"), &[spec("combat")])
        .await;

    assert_eq!(report.outcome, Outcome::Fatal);
    assert_eq!(report.resource_status, None);
    assert_eq!(report.wait_phase, WaitPhase::TimedOut);
    assert_eq!(report.polls, 6);
    assert_eq!(report.waited, Duration::from_secs(30));
    assert!(matches!(
        report.error,
        Some(StatvaultError::ProvisioningTimeout { polls: 6, .. })
    ));
    // one check before the request plus six polls
    assert_eq!(store.resource_checks(), 7);
    assert!(!report.retryable);
    assert!(report.sub_resources.is_empty());
    assert_eq!(store.count_executed("CREATE TABLE"), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_database_is_awaited_before_tables() {
    let store = MemoryStore::new().new_databases_visible_after(Some(3));

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("stats"), &[spec("combat")])
        .await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.polls, 3);
    assert_eq!(report.waited, Duration::from_secs(15));
    assert_eq!(store.tables("stats"), vec!["combat".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn failed_table_does_not_stop_the_rest() {
    let store = MemoryStore::new()
        .with_database("stats")
        .fail_statements_containing("`table_b`");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(
            &db("stats"),
            &[spec("table_a"), spec("table_b"), spec("table_c")],
        )
        .await;

    assert_eq!(report.outcome, Outcome::PartialFailure);
    assert!(report.error.is_none());
    assert_eq!(report.failed_sub_resources, vec!["table_b".to_string()]);
    assert_eq!(report.created(), vec!["table_a", "table_c"]);

    let failed = &report.sub_resources[1];
    assert!(matches!(
        &failed.status,
        SubResourceStatus::Failed {
            error: StatvaultError::SubResourceCreation { name, .. }
        } if name == "table_b"
    ));
    assert_eq!(
        store.tables("stats"),
        vec!["table_a".to_string(), "table_c".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn unreachable_server_is_fatal() {
    let store = MemoryStore::new().refuse_connections();

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("stats"), &[spec("combat")])
        .await;

    assert_eq!(report.outcome, Outcome::Fatal);
    assert!(matches!(report.error, Some(StatvaultError::Connection { .. })));
    assert!(report.retryable);
    assert!(report.sub_resources.is_empty());
    assert!(store.executed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn connection_lost_mid_sync_is_fatal_and_keeps_earlier_tables() {
    let store = MemoryStore::new()
        .with_database("stats")
        .refuse_scoped_connections_after(1);

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(
            &db("stats"),
            &[spec("table_a"), spec("table_b"), spec("table_c")],
        )
        .await;

    assert_eq!(report.outcome, Outcome::Fatal);
    assert_eq!(report.resource_status, Some(ResourceStatus::AlreadyExists));
    assert!(matches!(report.error, Some(StatvaultError::Connection { .. })));
    assert!(report.retryable);
    assert_eq!(report.sub_resources.len(), 1);
    assert_eq!(report.created(), vec!["table_a"]);
    assert!(report.failed_sub_resources.is_empty());
    assert_eq!(store.tables("stats"), vec!["table_a".to_string()]);
    assert_eq!(store.count_executed("CREATE TABLE IF NOT EXISTS `table_c`"), 0);
    assert_eq!(store.connections_opened(), store.connections_closed());
}

#[tokio::test(start_paused = true)]
async fn failed_table_check_marks_table_failed_and_continues() {
    let store = MemoryStore::new()
        .with_database("stats")
        .fail_statements_containing("INFORMATION_SCHEMA.TABLES");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("stats"), &[spec("table_a"), spec("table_b")])
        .await;

    assert_eq!(report.outcome, Outcome::PartialFailure);
    assert!(report.error.is_none());
    assert!(!report.retryable);
    assert_eq!(
        report.failed_sub_resources,
        vec!["table_a".to_string(), "table_b".to_string()]
    );
    assert!(report.sub_resources.iter().all(|outcome| matches!(
        &outcome.status,
        SubResourceStatus::Failed {
            error: StatvaultError::StoreUnavailable { .. }
        }
    )));
    assert_eq!(store.count_executed("CREATE TABLE"), 0);
}

#[tokio::test(start_paused = true)]
async fn every_connection_is_closed() {
    let store = MemoryStore::new()
        .new_databases_visible_after(Some(2))
        .fail_statements_containing("`samples_gained`");
    let tables = game_stats_tables().expect("schema is valid");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("helldivers_stats"), &tables)
        .await;

    assert_eq!(report.outcome, Outcome::PartialFailure);
    assert!(store.connections_opened() > 0);
    assert_eq!(store.connections_opened(), store.connections_closed());
    assert_eq!(store.max_open_connections(), 1);
}

#[tokio::test(start_paused = true)]
async fn report_serializes_failures_as_text() {
    let store = MemoryStore::new()
        .with_database("stats")
        .fail_statements_containing("`combat`");

    let report = Provisioner::new(&store, WaitPolicy::default())
        .provision(&db("stats"), &[spec("combat")])
        .await;

    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["outcome"], "partial_failure");
    assert_eq!(json["sub_resources"][0]["name"], "combat");
    assert_eq!(json["sub_resources"][0]["status"], "failed");
    assert!(json["sub_resources"][0]["error"].is_string());
}
