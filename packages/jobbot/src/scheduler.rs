//! Scheduled background cleanup using tokio-cron-scheduler.
//!
//! The retention engine runs independently of campaigns:
//!
//! ```text
//! Scheduler (daily)
//!     │
//!     └─► RetentionEngine::run_cleanup()
//!             └─► duplicates → retention rules → company quota
//! ```

use anyhow::Result;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::retention::{RetentionEngine, RetentionPolicy};
use crate::store::PostgresJobStore;

/// Start the scheduled cleanup task.
pub async fn start_scheduler(
    pool: PgPool,
    policy: RetentionPolicy,
    cron: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let cleanup_job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = pool.clone();
        let policy = policy.clone();
        Box::pin(async move {
            let engine = RetentionEngine::new(PostgresJobStore::new(pool), policy);
            match engine.run_cleanup().await {
                Ok(report) => {
                    tracing::info!(
                        removed = report.total_removed(),
                        remaining = report.post.total,
                        "Scheduled cleanup finished"
                    );
                }
                Err(e) => tracing::error!("Scheduled cleanup failed: {}", e),
            }
        })
    })?;

    scheduler.add(cleanup_job).await?;
    scheduler.start().await?;

    tracing::info!(cron = %cron, "Scheduled cleanup task started");
    Ok(scheduler)
}
