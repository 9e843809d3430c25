//! The collection pipeline: orchestrates every target through the
//! pagination crawler, deduplicates the union of discovered URLs against
//! the store, deep-analyzes the survivors and persists the results.
//!
//! Phases run strictly in sequence:
//!
//! ```text
//! Init -> { per target: Classify -> Paginate } -> Aggregate
//!      -> BatchDedup -> DeepAnalyze -> Persist -> Done
//! ```
//!
//! There is no intra-campaign parallelism: one shared rendering session and
//! one rate-limit posture per site.

use anyhow::Result;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::crawler::{crawl_target, Candidate, CrawlerTuning, StopReason, Target, TargetTier};
use crate::extract::{FitScorer, ListingExtractor};
use crate::kernel::BaseRenderer;
use crate::models::{NewJobRecord, UpsertOutcome, UserProfile};
use crate::store::JobStore;

/// Raw descriptions are stored up to this many characters.
const DESCRIPTION_STORAGE_BUDGET: usize = 5_000;

/// Fatal preconditions: these abort the run before any side effects.
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("no user profile configured in the store")]
    MissingProfile,
    #[error("no targets configured")]
    NoTargets,
}

/// Campaign-level knobs.
#[derive(Debug, Clone)]
pub struct CampaignTuning {
    pub crawler: CrawlerTuning,
    /// Existence checks are batched to bound store round-trips.
    pub exists_batch_size: usize,
    pub exists_batch_delay: Duration,
    /// Persistence batch = one store transaction.
    pub persist_batch_size: usize,
    pub persist_batch_delay: Duration,
    /// Detail pages shorter than this are skipped, not scored.
    pub min_description_chars: usize,
    pub detail_render_timeout: Duration,
    /// Wall-clock budget for the whole campaign.
    pub max_runtime: Duration,
}

impl Default for CampaignTuning {
    fn default() -> Self {
        Self {
            crawler: CrawlerTuning::default(),
            exists_batch_size: 100,
            exists_batch_delay: Duration::from_millis(250),
            persist_batch_size: 10,
            persist_batch_delay: Duration::from_millis(500),
            min_description_chars: 100,
            detail_render_timeout: Duration::from_secs(20),
            max_runtime: Duration::from_secs(7200),
        }
    }
}

/// Per-target outcome for the final report.
#[derive(Debug)]
pub struct TargetStats {
    pub url: String,
    pub tier: TargetTier,
    pub pages_visited: usize,
    pub candidates_found: usize,
    pub stop: StopReason,
}

/// What one campaign run did.
#[derive(Debug, Default)]
pub struct CampaignReport {
    pub targets_total: usize,
    pub targets_crawled: usize,
    pub urls_collected: usize,
    pub already_known: usize,
    pub analyzed: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub per_target: Vec<TargetStats>,
    pub elapsed: Duration,
}

impl CampaignReport {
    /// Contract value: how many jobs this run processed into the store.
    pub fn processed(&self) -> usize {
        self.inserted
    }
}

/// Run one full campaign over the given seed URLs.
///
/// Re-runnable: everything already persisted dedupes away on the next run.
pub async fn run_campaign(
    seeds: Vec<Url>,
    renderer: &impl BaseRenderer,
    extractor: &impl ListingExtractor,
    scorer: &impl FitScorer,
    store: &impl JobStore,
    tuning: &CampaignTuning,
) -> Result<CampaignReport> {
    let started = Instant::now();

    // Preconditions - fatal, before any crawling.
    let profile = store
        .load_profile()
        .await?
        .ok_or(CampaignError::MissingProfile)?;
    if seeds.is_empty() {
        return Err(CampaignError::NoTargets.into());
    }

    info!(targets = seeds.len(), "Starting campaign");

    let mut report = CampaignReport {
        targets_total: seeds.len(),
        ..Default::default()
    };

    // Classify + paginate, one target at a time, FIFO.
    let mut collected: Vec<Candidate> = Vec::new();
    let mut collected_urls: HashSet<String> = HashSet::new();

    for seed in seeds {
        if started.elapsed() > tuning.max_runtime {
            warn!(
                elapsed_secs = started.elapsed().as_secs(),
                "Campaign budget exceeded, skipping remaining targets"
            );
            break;
        }

        let target = Target::classify(seed);
        let crawl = crawl_target(
            &target,
            renderer,
            extractor,
            &tuning.crawler,
            &collected_urls,
        )
        .await;

        report.per_target.push(TargetStats {
            url: target.url.to_string(),
            tier: target.tier,
            pages_visited: crawl.pages_visited,
            candidates_found: crawl.candidates.len(),
            stop: crawl.stop,
        });
        report.targets_crawled += 1;

        for candidate in crawl.candidates {
            if collected_urls.insert(candidate.url.clone()) {
                collected.push(candidate);
            }
        }
    }

    report.urls_collected = collected.len();
    info!(urls = collected.len(), "Aggregation complete");

    // Batched dedup against the store. A failed batch is treated as
    // all-new: re-analyzing is cheaper than silently dropping candidates.
    let mut existing: HashSet<String> = HashSet::new();
    let urls: Vec<String> = collected.iter().map(|c| c.url.clone()).collect();
    for (i, chunk) in urls.chunks(tuning.exists_batch_size).enumerate() {
        if i > 0 {
            sleep(tuning.exists_batch_delay).await;
        }
        match store.filter_existing(chunk).await {
            Ok(found) => existing.extend(found),
            Err(e) => {
                warn!(
                    batch = i,
                    size = chunk.len(),
                    error = %e,
                    "Existence check failed, treating batch as new"
                );
            }
        }
    }
    report.already_known = existing.len();

    let worklist: Vec<&Candidate> = collected
        .iter()
        .filter(|c| !existing.contains(&c.url))
        .collect();
    info!(
        worklist = worklist.len(),
        already_known = report.already_known,
        "Deduplication complete"
    );

    // Deep analysis: single render attempt, then the gated scorer.
    let mut records: Vec<NewJobRecord> = Vec::new();
    for candidate in worklist {
        if started.elapsed() > tuning.max_runtime {
            warn!("Campaign budget exceeded, skipping remaining analysis");
            break;
        }

        match analyze_candidate(candidate, &profile, renderer, scorer, tuning).await {
            Some(record) => {
                report.analyzed += 1;
                records.push(record);
            }
            None => report.skipped += 1,
        }
    }

    // Batched persistence; a failed batch degrades to per-record inserts.
    for (i, batch) in records.chunks(tuning.persist_batch_size).enumerate() {
        if i > 0 {
            sleep(tuning.persist_batch_delay).await;
        }
        match store.insert_batch(batch.to_vec()).await {
            Ok(outcome) => {
                report.inserted += outcome.inserted;
                report.duplicates += outcome.duplicates;
            }
            Err(e) => {
                warn!(batch = i, error = %e, "Batch insert failed, retrying per record");
                for record in batch {
                    match store.insert_if_absent(record.clone()).await {
                        Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                        Ok(UpsertOutcome::Duplicate) => report.duplicates += 1,
                        Err(e) => {
                            warn!(url = %record.url, error = %e, "Failed to save job");
                            report.failed += 1;
                        }
                    }
                }
            }
        }
    }

    report.elapsed = started.elapsed();
    info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        failed = report.failed,
        elapsed_secs = report.elapsed.as_secs(),
        "Campaign complete"
    );

    Ok(report)
}

/// Render and score one candidate. Returns None when the page is
/// unrenderable or too thin to score - skipped, never retried.
async fn analyze_candidate(
    candidate: &Candidate,
    profile: &UserProfile,
    renderer: &impl BaseRenderer,
    scorer: &impl FitScorer,
    tuning: &CampaignTuning,
) -> Option<NewJobRecord> {
    let page = match renderer
        .render(&candidate.url, tuning.detail_render_timeout)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %candidate.url, error = %e, "Detail render failed, skipping");
            return None;
        }
    };

    if page.markdown.trim().len() < tuning.min_description_chars {
        warn!(url = %candidate.url, "Insufficient job description content, skipping");
        return None;
    }

    let assessment = match scorer.score(profile, &page.markdown).await {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!(url = %candidate.url, error = %e, "Fit scoring failed, skipping");
            return None;
        }
    };

    info!(
        url = %candidate.url,
        title = %candidate.title,
        score = assessment.match_score,
        "Job analyzed"
    );

    let mut description = page.markdown;
    let cut = description
        .char_indices()
        .nth(DESCRIPTION_STORAGE_BUDGET)
        .map(|(idx, _)| idx);
    if let Some(idx) = cut {
        description.truncate(idx);
    }

    Some(NewJobRecord {
        url: candidate.url.clone(),
        title: candidate.title.clone(),
        company: candidate.company.clone(),
        location: candidate.location.clone(),
        raw_description: description,
        match_score: assessment.match_score.clamp(1, 10),
        match_summary: assessment.match_summary,
        matching_skills: assessment.matching_skills,
        missing_skills: assessment.missing_skills,
        salary_range: assessment.salary_range,
        company_info: assessment.company_info,
    })
}
