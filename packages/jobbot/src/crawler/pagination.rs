//! The per-target pagination crawler.
//!
//! Drives one target through successive listing pages: render with
//! retry/backoff, extract listings, collect new candidate URLs, follow the
//! next link until a stop condition fires.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::{is_rate_limit_error, ListingExtractor, ListingPage};
use crate::kernel::{BaseRenderer, RenderedPage};
use crate::urls;

use super::state::{CrawlState, PageDecision, StopReason};
use super::tiers::{Target, TierTable};

/// Crawl knobs shared by every target.
#[derive(Debug, Clone)]
pub struct CrawlerTuning {
    pub tiers: TierTable,
    pub render_timeout: Duration,
    /// Navigation attempts per page before the target gives up.
    pub max_attempts: usize,
    /// Backoff after each failed attempt.
    pub retry_delays: Vec<Duration>,
    pub rate_limit_cooldown: Duration,
}

impl Default for CrawlerTuning {
    fn default() -> Self {
        Self {
            tiers: TierTable::default(),
            render_timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delays: vec![
                Duration::from_secs(2),
                Duration::from_secs(5),
                Duration::from_secs(10),
            ],
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

/// A normalized job URL plus the listing metadata captured with it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
}

/// Result of draining one target.
#[derive(Debug)]
pub struct TargetCrawl {
    pub candidates: Vec<Candidate>,
    pub pages_visited: usize,
    pub stop: StopReason,
}

/// Drain one target's pagination. `known_urls` carries the campaign-wide
/// accumulator so per-page yields count only genuinely new URLs.
pub async fn crawl_target(
    target: &Target,
    renderer: &impl BaseRenderer,
    extractor: &impl ListingExtractor,
    tuning: &CrawlerTuning,
    known_urls: &HashSet<String>,
) -> TargetCrawl {
    let params = tuning.tiers.params_for(target);
    let mut state = CrawlState::new(target.url.clone());
    let mut seen_urls = known_urls.clone();
    let mut candidates = Vec::new();

    info!(
        url = %target.url,
        tier = ?target.tier,
        page_cap = params.page_cap,
        "Starting target crawl"
    );

    let stop = loop {
        let page_url = state.current_url().clone();
        debug!(url = %page_url, page = state.pages_visited(), "Navigating to page");

        let Some(page) = navigate_with_retry(renderer, page_url.as_str(), tuning).await else {
            break StopReason::NavigationFailed;
        };

        let listing = extract_page(extractor, &page, &page_url, state.pages_visited(), tuning).await;

        let mut new_this_page = 0;
        for job in &listing.jobs {
            let Some(normalized) = urls::resolve_and_normalize(&page_url, &job.url) else {
                debug!(link = %job.url, "Dropping unresolvable job link");
                continue;
            };
            if seen_urls.insert(normalized.clone()) {
                candidates.push(Candidate {
                    url: normalized,
                    title: job.title.clone(),
                    company: job.company.clone(),
                    location: job.location.clone(),
                });
                new_this_page += 1;
            }
        }
        state.record_yield(new_this_page);

        debug!(
            url = %page_url,
            listings = listing.jobs.len(),
            new_urls = new_this_page,
            "Page processed"
        );

        // Pagination links keep their query strings: "?page=2" is the whole
        // point. Only job links get normalized.
        let next = listing
            .next_page_url
            .as_deref()
            .and_then(|link| page_url.join(link.trim()).ok())
            .filter(|u| matches!(u.scheme(), "http" | "https"));

        match state.decide_next(next.as_ref(), params.page_cap) {
            PageDecision::Stop(reason) => break reason,
            PageDecision::Continue => {
                sleep(params.page_delay).await;
                // decide_next only continues when a next link exists
                if let Some(next) = next {
                    state.advance(next);
                }
            }
        }
    };

    info!(
        url = %target.url,
        pages = state.pages_visited(),
        candidates = candidates.len(),
        stop = ?stop,
        "Target crawl finished"
    );

    TargetCrawl {
        candidates,
        pages_visited: state.pages_visited(),
        stop,
    }
}

/// Navigate with bounded retries and increasing backoff. All attempts
/// failing is not fatal to the campaign - the target just ends.
async fn navigate_with_retry(
    renderer: &impl BaseRenderer,
    url: &str,
    tuning: &CrawlerTuning,
) -> Option<RenderedPage> {
    for attempt in 0..tuning.max_attempts {
        match renderer.render(url, tuning.render_timeout).await {
            Ok(page) => return Some(page),
            Err(e) => {
                warn!(
                    url = %url,
                    attempt = attempt + 1,
                    error = %e,
                    "Navigation attempt failed"
                );
                if attempt + 1 < tuning.max_attempts {
                    if let Some(delay) = tuning.retry_delays.get(attempt) {
                        sleep(*delay).await;
                    }
                }
            }
        }
    }

    warn!(
        url = %url,
        attempts = tuning.max_attempts,
        "Navigation failed after all retries"
    );
    None
}

/// Run listing extraction for one page. Extraction failures contribute
/// nothing and are never retried; a rate-limit signal pauses first.
async fn extract_page(
    extractor: &impl ListingExtractor,
    page: &RenderedPage,
    page_url: &Url,
    page_number: usize,
    tuning: &CrawlerTuning,
) -> ListingPage {
    match extractor
        .extract_listings(&page.markdown, page_url, page_number)
        .await
    {
        Ok(listing) => listing,
        Err(e) => {
            if is_rate_limit_error(&e) {
                warn!(
                    cooldown_secs = tuning.rate_limit_cooldown.as_secs(),
                    "Extraction service rate limited during listing crawl, cooling down"
                );
                sleep(tuning.rate_limit_cooldown).await;
            } else {
                warn!(url = %page_url, error = %e, "Listing extraction failed");
            }
            ListingPage::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ListingJob;
    use crate::kernel::test_dependencies::{MockListingExtractor, MockRenderer};

    fn job(n: usize) -> ListingJob {
        ListingJob {
            title: format!("Engineer {}", n),
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

    fn fast_tuning() -> CrawlerTuning {
        let mut tuning = CrawlerTuning::default();
        tuning.retry_delays = vec![Duration::from_millis(1); 2];
        tuning.rate_limit_cooldown = Duration::from_millis(1);
        for params in [
            &mut tuning.tiers.top_tier,
            &mut tuning.tiers.mid_tier,
            &mut tuning.tiers.services,
            &mut tuning.tiers.startup,
            &mut tuning.tiers.aggregator,
            &mut tuning.tiers.unknown,
        ] {
            params.page_delay = Duration::from_millis(1);
        }
        tuning
    }

    fn target(url: &str) -> Target {
        Target::classify(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn never_exceeds_tier_page_cap() {
        // Unknown tier, cap 3; every page links onward forever.
        let mut renderer = MockRenderer::new();
        let mut extractor = MockListingExtractor::new();
        for n in 1..=10 {
            let url = format!("https://smallco.example.com/jobs?page={}", n);
            renderer = renderer.with_page(&url, "listing content");
            extractor = extractor.with_page(
                &url,
                listing(
                    vec![job(n)],
                    Some(&format!("/jobs?page={}", n + 1)),
                ),
            );
        }

        let result = crawl_target(
            &target("https://smallco.example.com/jobs?page=1"),
            &renderer,
            &extractor,
            &fast_tuning(),
            &HashSet::new(),
        )
        .await;

        assert_eq!(result.pages_visited, 3);
        assert_eq!(result.stop, StopReason::PageCap);
        assert_eq!(result.candidates.len(), 3);
    }

    #[tokio::test]
    async fn stops_on_cycle_back_to_first_page() {
        let p1 = "https://smallco.example.com/jobs?page=1";
        let p2 = "https://smallco.example.com/jobs?page=2";
        let renderer = MockRenderer::new()
            .with_page(p1, "listing content")
            .with_page(p2, "listing content");
        let extractor = MockListingExtractor::new()
            .with_page(p1, listing(vec![job(1)], Some("/jobs?page=2")))
            .with_page(p2, listing(vec![job(2)], Some("/jobs?page=1")));

        let result = crawl_target(
            &target(p1),
            &renderer,
            &extractor,
            &fast_tuning(),
            &HashSet::new(),
        )
        .await;

        assert_eq!(result.stop, StopReason::Cycle);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn navigation_failure_ends_target_gracefully() {
        // No pages scripted: every render attempt fails.
        let renderer = MockRenderer::new();
        let extractor = MockListingExtractor::new();

        let result = crawl_target(
            &target("https://smallco.example.com/jobs"),
            &renderer,
            &extractor,
            &fast_tuning(),
            &HashSet::new(),
        )
        .await;

        assert_eq!(result.stop, StopReason::NavigationFailed);
        assert!(result.candidates.is_empty());
        // 3 attempts against the single page
        assert_eq!(renderer.render_calls().len(), 3);
    }

    #[tokio::test]
    async fn known_urls_do_not_count_as_new_yield() {
        let p1 = "https://smallco.example.com/jobs?page=1";
        let p2 = "https://smallco.example.com/jobs?page=2";
        let p3 = "https://smallco.example.com/jobs?page=3";
        let renderer = MockRenderer::new()
            .with_page(p1, "c")
            .with_page(p2, "c")
            .with_page(p3, "c");
        // Pages 1 and 2 repeat a URL the campaign already collected.
        let extractor = MockListingExtractor::new()
            .with_page(p1, listing(vec![job(99)], Some("/jobs?page=2")))
            .with_page(p2, listing(vec![job(99)], Some("/jobs?page=3")))
            .with_page(p3, listing(vec![job(1)], None));

        let known: HashSet<String> =
            ["https://smallco.example.com/job/99".to_string()].into();

        let result = crawl_target(
            &target(p1),
            &renderer,
            &extractor,
            &fast_tuning(),
            &known,
        )
        .await;

        // Two dry pages in a row stop the crawl before page 3.
        assert_eq!(result.stop, StopReason::EarlyTermination);
        assert_eq!(result.pages_visited, 2);
        assert!(result.candidates.is_empty());
    }
}
