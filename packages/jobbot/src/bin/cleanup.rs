// Entry point for the retention cleanup job

use anyhow::{Context, Result};
use clap::Parser;
use jobbot::retention::{RetentionEngine, RetentionPolicy};
use jobbot::scheduler::start_scheduler;
use jobbot::store::PostgresJobStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(about = "Apply the retention policy to the job store")]
struct Args {
    /// Report what would be deleted without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Keep running and apply the policy on a schedule instead of once
    #[arg(long)]
    schedule: bool,

    /// Cron expression for --schedule (seconds-resolution)
    #[arg(long, default_value = "0 0 3 * * *")]
    cron: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobbot=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    if args.schedule {
        let _scheduler = start_scheduler(pool, RetentionPolicy::default(), &args.cron).await?;
        tracing::info!("Cleanup scheduler running, press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        return Ok(());
    }

    let engine = RetentionEngine::new(PostgresJobStore::new(pool), RetentionPolicy::default());
    let report = if args.dry_run {
        engine.preview().await?
    } else {
        engine.run_cleanup().await?
    };

    tracing::info!(
        dry_run = report.dry_run,
        duplicates_removed = report.duplicates_removed,
        quota_removed = report.quota_removed,
        total_removed = report.total_removed(),
        "Cleanup summary"
    );
    for (rule, removed) in &report.rule_removals {
        if *removed > 0 {
            tracing::info!(rule = %rule, removed = *removed, "Rule removals");
        }
    }
    tracing::info!(
        pre_total = report.pre.total,
        post_total = report.post.total,
        "Store size"
    );

    if report.post.total > 1000 {
        tracing::warn!("Store exceeds 1,000 jobs - consider tightening retention");
    } else if report.post.total > 500 {
        tracing::info!("Store approaching 500 jobs - monitoring recommended");
    }

    Ok(())
}
