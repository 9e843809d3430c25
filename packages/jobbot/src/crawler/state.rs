//! Per-target crawl state and the pure pagination decision.
//!
//! One `CrawlState` lives exactly as long as one target's pagination loop.
//! The decision function has no I/O so every stop condition is testable
//! without a renderer.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// How many per-page yield counts the early-termination window keeps.
const YIELD_WINDOW: usize = 3;

/// Why pagination ended for a target. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page reported no next link.
    NoNextPage,
    /// The next link pointed at the current page or a page already visited.
    Cycle,
    /// The tier's page cap was reached.
    PageCap,
    /// The last two pages yielded no new URLs.
    EarlyTermination,
    /// Navigation failed after all retries.
    NavigationFailed,
}

/// Verdict for one processed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDecision {
    Continue,
    Stop(StopReason),
}

/// Mutable context for one target's pagination loop.
#[derive(Debug)]
pub struct CrawlState {
    current_url: Url,
    pages_visited: usize,
    seen_pages: HashSet<String>,
    recent_yields: VecDeque<usize>,
}

impl CrawlState {
    pub fn new(seed: Url) -> Self {
        Self {
            current_url: seed,
            pages_visited: 1,
            seen_pages: HashSet::new(),
            recent_yields: VecDeque::with_capacity(YIELD_WINDOW),
        }
    }

    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    /// Record how many new candidate URLs the just-processed page yielded.
    pub fn record_yield(&mut self, new_urls: usize) {
        if self.recent_yields.len() == YIELD_WINDOW {
            self.recent_yields.pop_front();
        }
        self.recent_yields.push_back(new_urls);
    }

    fn last_two_pages_empty(&self) -> bool {
        self.recent_yields.len() >= 2
            && self.recent_yields.iter().rev().take(2).sum::<usize>() == 0
    }

    /// Decide whether to follow the next-page link.
    ///
    /// Checked in order: missing link, cycle, page cap, early termination.
    /// Cycle before cap so a revisit is reported as a cycle even when the
    /// budget also happens to be exhausted.
    pub fn decide_next(&self, next_link: Option<&Url>, page_cap: usize) -> PageDecision {
        let Some(next) = next_link else {
            return PageDecision::Stop(StopReason::NoNextPage);
        };

        if next == &self.current_url || self.seen_pages.contains(next.as_str()) {
            return PageDecision::Stop(StopReason::Cycle);
        }

        if self.pages_visited >= page_cap {
            return PageDecision::Stop(StopReason::PageCap);
        }

        if self.last_two_pages_empty() {
            return PageDecision::Stop(StopReason::EarlyTermination);
        }

        PageDecision::Continue
    }

    /// Move to the next page. The page just left joins the cycle guard.
    pub fn advance(&mut self, next: Url) {
        self.seen_pages.insert(self.current_url.as_str().to_string());
        self.current_url = next;
        self.pages_visited += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn stops_without_next_link() {
        let state = CrawlState::new(url("https://x.com/jobs"));
        assert_eq!(
            state.decide_next(None, 5),
            PageDecision::Stop(StopReason::NoNextPage)
        );
    }

    #[test]
    fn detects_self_link_cycle() {
        let state = CrawlState::new(url("https://x.com/jobs?page=1"));
        let next = url("https://x.com/jobs?page=1");
        assert_eq!(
            state.decide_next(Some(&next), 5),
            PageDecision::Stop(StopReason::Cycle)
        );
    }

    #[test]
    fn detects_revisit_cycle() {
        let mut state = CrawlState::new(url("https://x.com/jobs?page=1"));
        state.advance(url("https://x.com/jobs?page=2"));
        state.advance(url("https://x.com/jobs?page=3"));

        let back_to_first = url("https://x.com/jobs?page=1");
        assert_eq!(
            state.decide_next(Some(&back_to_first), 8),
            PageDecision::Stop(StopReason::Cycle)
        );
    }

    #[test]
    fn enforces_page_cap() {
        let mut state = CrawlState::new(url("https://x.com/jobs?page=1"));
        state.record_yield(5);
        state.advance(url("https://x.com/jobs?page=2"));
        state.record_yield(5);
        state.advance(url("https://x.com/jobs?page=3"));
        state.record_yield(5);

        let next = url("https://x.com/jobs?page=4");
        assert_eq!(
            state.decide_next(Some(&next), 3),
            PageDecision::Stop(StopReason::PageCap)
        );
    }

    #[test]
    fn terminates_early_after_two_dry_pages() {
        let mut state = CrawlState::new(url("https://x.com/jobs?page=1"));
        state.record_yield(5);
        state.advance(url("https://x.com/jobs?page=2"));
        state.record_yield(0);
        state.advance(url("https://x.com/jobs?page=3"));
        state.record_yield(0);

        let next = url("https://x.com/jobs?page=4");
        assert_eq!(
            state.decide_next(Some(&next), 8),
            PageDecision::Stop(StopReason::EarlyTermination)
        );
    }

    #[test]
    fn one_dry_page_is_not_enough_to_stop() {
        let mut state = CrawlState::new(url("https://x.com/jobs?page=1"));
        state.record_yield(0);

        let next = url("https://x.com/jobs?page=2");
        assert_eq!(state.decide_next(Some(&next), 8), PageDecision::Continue);
    }
}
