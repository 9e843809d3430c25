//! Integration tests for the collection pipeline.
//!
//! Drives run_campaign end-to-end with mock collaborators and the
//! in-memory store: pagination, cycle detection, cross-run deduplication
//! and failure degradation.

use std::time::Duration;
use url::Url;
use uuid::Uuid;

use jobbot::crawler::StopReason;
use jobbot::extract::{ListingJob, ListingPage};
use jobbot::kernel::test_dependencies::{MockFitScorer, MockListingExtractor, MockRenderer};
use jobbot::models::UserProfile;
use jobbot::pipeline::{run_campaign, CampaignTuning};
use jobbot::store::MemoryJobStore;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_profile() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        full_name: Some("Test Candidate".to_string()),
        summary: Some("Entry-level backend engineer".to_string()),
        experience: None,
        education: None,
        projects: None,
        skills: Some("python, rust, sql".to_string()),
    }
}

/// Tuning with all pacing delays collapsed so tests run instantly.
fn fast_tuning() -> CampaignTuning {
    let mut tuning = CampaignTuning::default();
    tuning.crawler.retry_delays = vec![Duration::from_millis(1); 2];
    tuning.crawler.rate_limit_cooldown = Duration::from_millis(1);
    for params in [
        &mut tuning.crawler.tiers.top_tier,
        &mut tuning.crawler.tiers.mid_tier,
        &mut tuning.crawler.tiers.services,
        &mut tuning.crawler.tiers.startup,
        &mut tuning.crawler.tiers.aggregator,
        &mut tuning.crawler.tiers.unknown,
    ] {
        params.page_delay = Duration::from_millis(1);
    }
    tuning.exists_batch_delay = Duration::from_millis(1);
    tuning.persist_batch_delay = Duration::from_millis(1);
    tuning
}

fn job_link(n: usize) -> ListingJob {
    ListingJob {
        title: format!("Software Engineer {}", n),
        company: "Acme".to_string(),
        location: Some("Remote".to_string()),
        url: format!("/job/{}", n),
    }
}

fn listing(jobs: Vec<ListingJob>, next: Option<&str>) -> ListingPage {
    ListingPage {
        jobs,
        next_page_url: next.map(str::to_string),
    }
}

fn detail_markdown(n: usize) -> String {
    format!(
        "# Software Engineer {}\n\nAcme is hiring. You will build services in Rust and Python, \
         own deployments end to end and work with a small product team. SQL experience helps.",
        n
    )
}

// =============================================================================
// End-to-end scenario: aggregator target with a pagination cycle
// =============================================================================

/// Aggregator tier (cap 8), 3 listing pages with 5 unique links each, and
/// page 3 linking back to page 1. Pagination must stop on the cycle, not
/// the cap, and exactly 15 candidates must be collected and persisted.
#[tokio::test]
async fn aggregator_cycle_scenario_collects_fifteen_jobs() {
    let base = "https://www.naukri.com/it-jobs?page=1";
    let page2 = "https://www.naukri.com/it-jobs?page=2";
    let page3 = "https://www.naukri.com/it-jobs?page=3";

    let mut renderer = MockRenderer::new()
        .with_page(base, "listing page 1")
        .with_page(page2, "listing page 2")
        .with_page(page3, "listing page 3");
    for n in 1..=15 {
        renderer = renderer.with_page(
            &format!("https://www.naukri.com/job/{}", n),
            &detail_markdown(n),
        );
    }

    let extractor = MockListingExtractor::new()
        .with_page(
            base,
            listing((1..=5).map(job_link).collect(), Some("/it-jobs?page=2")),
        )
        .with_page(
            page2,
            listing((6..=10).map(job_link).collect(), Some("/it-jobs?page=3")),
        )
        .with_page(
            page3,
            listing((11..=15).map(job_link).collect(), Some("/it-jobs?page=1")),
        );

    let store = MemoryJobStore::new().with_profile(test_profile());
    let report = run_campaign(
        vec![Url::parse(base).unwrap()],
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &fast_tuning(),
    )
    .await
    .unwrap();

    assert_eq!(report.urls_collected, 15);
    assert_eq!(report.processed(), 15);

    let stats = &report.per_target[0];
    assert_eq!(stats.pages_visited, 3);
    assert_eq!(
        stats.stop,
        StopReason::Cycle,
        "pagination should stop on the cycle, not the page cap"
    );

    assert_eq!(store.snapshot().len(), 15);
}

/// Running the identical campaign twice against an unchanged store must
/// insert nothing the second time.
#[tokio::test]
async fn second_identical_run_inserts_nothing() {
    let base = "https://smallco.example.com/careers";
    let mut renderer = MockRenderer::new().with_page(base, "listing");
    for n in 1..=4 {
        renderer = renderer.with_page(
            &format!("https://smallco.example.com/job/{}", n),
            &detail_markdown(n),
        );
    }
    let extractor = MockListingExtractor::new()
        .with_page(base, listing((1..=4).map(job_link).collect(), None));

    let store = MemoryJobStore::new().with_profile(test_profile());
    let tuning = fast_tuning();
    let seeds = || vec![Url::parse(base).unwrap()];

    let first = run_campaign(
        seeds(),
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &tuning,
    )
    .await
    .unwrap();
    assert_eq!(first.processed(), 4);

    let second = run_campaign(
        seeds(),
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &tuning,
    )
    .await
    .unwrap();
    assert_eq!(second.processed(), 0);
    assert_eq!(second.already_known, 4);
    assert_eq!(store.snapshot().len(), 4);
}

// =============================================================================
// Failure degradation
// =============================================================================

/// A failed existence batch must be treated as all-new: candidates get
/// re-analyzed and dedup falls to the insert path instead of being dropped.
#[tokio::test]
async fn failed_existence_batch_is_treated_as_all_new() {
    let base = "https://smallco.example.com/careers";
    let mut renderer = MockRenderer::new().with_page(base, "listing");
    for n in 1..=3 {
        renderer = renderer.with_page(
            &format!("https://smallco.example.com/job/{}", n),
            &detail_markdown(n),
        );
    }
    let extractor = MockListingExtractor::new()
        .with_page(base, listing((1..=3).map(job_link).collect(), None));

    let store = MemoryJobStore::new().with_profile(test_profile());

    // First run populates the store, then the existence check is broken for
    // the second run.
    let tuning = fast_tuning();
    run_campaign(
        vec![Url::parse(base).unwrap()],
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &tuning,
    )
    .await
    .unwrap();

    store.fail_next_filter_existing();
    let report = run_campaign(
        vec![Url::parse(base).unwrap()],
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &tuning,
    )
    .await
    .unwrap();

    // Everything was re-analyzed, the upsert reported duplicates, nothing
    // was lost and nothing double-inserted.
    assert_eq!(report.analyzed, 3);
    assert_eq!(report.duplicates, 3);
    assert_eq!(report.processed(), 0);
    assert_eq!(store.snapshot().len(), 3);
}

/// A failed insert transaction degrades to per-record inserts without
/// losing the batch.
#[tokio::test]
async fn failed_insert_batch_degrades_to_per_record() {
    let base = "https://smallco.example.com/careers";
    let mut renderer = MockRenderer::new().with_page(base, "listing");
    for n in 1..=5 {
        renderer = renderer.with_page(
            &format!("https://smallco.example.com/job/{}", n),
            &detail_markdown(n),
        );
    }
    let extractor = MockListingExtractor::new()
        .with_page(base, listing((1..=5).map(job_link).collect(), None));

    let store = MemoryJobStore::new().with_profile(test_profile());
    store.fail_next_insert_batch();

    let report = run_campaign(
        vec![Url::parse(base).unwrap()],
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &fast_tuning(),
    )
    .await
    .unwrap();

    assert_eq!(report.processed(), 5);
    assert_eq!(report.failed, 0);
    assert_eq!(store.snapshot().len(), 5);
}

/// Unrenderable or too-thin detail pages are skipped, never retried, and
/// the rest of the worklist continues.
#[tokio::test]
async fn thin_or_failed_detail_pages_are_skipped() {
    let base = "https://smallco.example.com/careers";
    let renderer = MockRenderer::new()
        .with_page(base, "listing")
        .with_page("https://smallco.example.com/job/1", &detail_markdown(1))
        .with_page("https://smallco.example.com/job/2", "too short");
    // job/3 has no page at all: the single render attempt fails.
    let extractor = MockListingExtractor::new()
        .with_page(base, listing((1..=3).map(job_link).collect(), None));

    let store = MemoryJobStore::new().with_profile(test_profile());
    let report = run_campaign(
        vec![Url::parse(base).unwrap()],
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &fast_tuning(),
    )
    .await
    .unwrap();

    assert_eq!(report.analyzed, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.processed(), 1);
}

// =============================================================================
// Preconditions
// =============================================================================

#[tokio::test]
async fn missing_profile_aborts_before_crawling() {
    let renderer = MockRenderer::new();
    let extractor = MockListingExtractor::new();
    let store = MemoryJobStore::new(); // no profile

    let result = run_campaign(
        vec![Url::parse("https://smallco.example.com/careers").unwrap()],
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &fast_tuning(),
    )
    .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("profile"));
    assert!(renderer.render_calls().is_empty(), "no side effects expected");
}

#[tokio::test]
async fn empty_target_list_is_fatal() {
    let renderer = MockRenderer::new();
    let extractor = MockListingExtractor::new();
    let store = MemoryJobStore::new().with_profile(test_profile());

    let result = run_campaign(
        Vec::new(),
        &renderer,
        &extractor,
        &MockFitScorer::new(),
        &store,
        &fast_tuning(),
    )
    .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("targets"));
}
