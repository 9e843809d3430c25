// Main entry point for a crawl campaign run

use anyhow::{Context, Result};
use jobbot::config::{self, Config};
use jobbot::extract::{FallbackFitScorer, LlmListingExtractor};
use jobbot::kernel::{BrowserRenderer, OpenAIClient};
use jobbot::pipeline::{run_campaign, CampaignTuning};
use jobbot::store::PostgresJobStore;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobbot=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting JobBot campaign");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let targets = config::load_targets(&config.targets_file)?;
    tracing::info!(targets = targets.len(), "Configuration loaded");

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    // Wire up collaborators
    let store = PostgresJobStore::new(pool);
    let renderer =
        BrowserRenderer::new(config.renderer_url.clone()).context("Failed to create renderer")?;
    let ai = OpenAIClient::new(config.openai_api_key.clone(), config.openai_model.clone());
    let extractor = LlmListingExtractor::new(ai.clone());
    let scorer = FallbackFitScorer::new(ai);

    let tuning = CampaignTuning {
        max_runtime: Duration::from_secs(config.max_runtime_secs),
        ..Default::default()
    };

    let report = run_campaign(targets, &renderer, &extractor, &scorer, &store, &tuning).await?;

    tracing::info!(
        targets_crawled = report.targets_crawled,
        urls_collected = report.urls_collected,
        analyzed = report.analyzed,
        processed = report.processed(),
        duplicates = report.duplicates,
        failed = report.failed,
        elapsed_secs = report.elapsed.as_secs(),
        "Campaign run complete"
    );

    for target in &report.per_target {
        tracing::info!(
            url = %target.url,
            tier = ?target.tier,
            pages = target.pages_visited,
            candidates = target.candidates_found,
            stop = ?target.stop,
            "Target summary"
        );
    }

    Ok(())
}
