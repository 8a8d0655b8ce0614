use mimalloc::MiMalloc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use statvault::config::Config;
use statvault::db::game_stats_tables;
use statvault::provision::Outcome;
use statvault::utils::logging::with_pretty_json_debug;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        host = %cfg.store.host,
        port = cfg.store.port,
        username = %cfg.store.username,
        database = %cfg.store.database,
        loglevel = %cfg.basic.loglevel,
        poll_interval_secs = cfg.provisioning.poll_interval_secs,
        wait_ceiling_secs = cfg.provisioning.wait_ceiling_secs,
    );

    let descriptor = cfg.store.descriptor()?;
    let policy = cfg.provisioning.wait_policy()?;
    let tables = game_stats_tables()?;

    let report = statvault::provision(&descriptor, &tables, policy).await;

    with_pretty_json_debug(&report, |pretty_report| {
        tracing::debug!(report = %pretty_report, "provisioning report");
    });

    info!(
        database = %report.resource,
        created = report.created().len(),
        tables = report.sub_resources.len(),
        failed = report.failed_sub_resources.len(),
        "table summary"
    );

    match report.outcome {
        Outcome::Success => {
            info!(database = %report.resource, polls = report.polls, "database ready");
            Ok(())
        }
        Outcome::PartialFailure => {
            warn!(
                database = %report.resource,
                failed = ?report.failed_sub_resources,
                "database ready with missing tables"
            );
            Ok(())
        }
        Outcome::Fatal => {
            let err = report
                .error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "provisioning failed".to_string());
            error!(
                database = %report.resource,
                error = %err,
                retryable = report.retryable,
                "provisioning failed"
            );
            Err(err.into())
        }
    }
}
