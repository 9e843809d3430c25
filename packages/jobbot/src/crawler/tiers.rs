//! Target classification and the tier → crawl-parameter table.
//!
//! Tier decides how deep we paginate and how hard we lean on a site.
//! All tier-dependent knobs live here so the crawler itself carries no
//! per-site branching.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Classification of a career-site target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetTier {
    /// Large-company career sites with strict anti-bot posture.
    TopTier,
    /// Established product companies.
    MidTier,
    /// Outsourcing / services firms.
    Services,
    /// Startup job boards.
    Startup,
    /// Aggregator job boards with deep pagination.
    Aggregator,
    Unknown,
}

const TOP_TIER_DOMAINS: [&str; 5] = [
    "google.com",
    "metacareers.com",
    "apple.com",
    "amazon.jobs",
    "netflix.com",
];

const MID_TIER_DOMAINS: [&str; 4] = ["microsoft.com", "adobe.com", "uber.com", "atlassian.com"];

const SERVICES_DOMAINS: [&str; 5] = [
    "accenture.com",
    "ibm.com",
    "tcs.com",
    "infosys.com",
    "wipro.com",
];

const STARTUP_DOMAINS: [&str; 4] = [
    "wellfound.com",
    "startup.jobs",
    "builtin.com",
    "ycombinator",
];

const AGGREGATOR_DOMAINS: [&str; 6] = [
    "naukri.com",
    "shine.com",
    "dice.com",
    "foundit.in",
    "linkedin.com",
    "indeed.com",
];

/// Entry-level / campus listings never run deep regardless of tier.
const CAMPUS_KEYWORDS: [&str; 6] = [
    "university",
    "intern",
    "graduate",
    "campus",
    "fresher",
    "entry-level",
];

/// One seed career-site URL with its derived tier. Immutable once
/// classified.
#[derive(Debug, Clone)]
pub struct Target {
    pub url: Url,
    pub tier: TargetTier,
}

impl Target {
    /// Classify a seed URL by domain substring.
    pub fn classify(url: Url) -> Self {
        let tier = classify_url(url.as_str());
        Self { url, tier }
    }
}

fn classify_url(url: &str) -> TargetTier {
    let matches_any = |domains: &[&str]| domains.iter().any(|d| url.contains(d));

    if matches_any(&TOP_TIER_DOMAINS) {
        TargetTier::TopTier
    } else if matches_any(&MID_TIER_DOMAINS) {
        TargetTier::MidTier
    } else if matches_any(&SERVICES_DOMAINS) {
        TargetTier::Services
    } else if matches_any(&STARTUP_DOMAINS) {
        TargetTier::Startup
    } else if matches_any(&AGGREGATOR_DOMAINS) {
        TargetTier::Aggregator
    } else {
        TargetTier::Unknown
    }
}

/// Crawl parameters for one target.
#[derive(Debug, Clone, Copy)]
pub struct TierParams {
    pub page_cap: usize,
    pub page_delay: Duration,
}

/// The tier → parameter table. One place, so tests and operators can read
/// off exactly what each tier gets.
#[derive(Debug, Clone)]
pub struct TierTable {
    pub top_tier: TierParams,
    pub mid_tier: TierParams,
    pub services: TierParams,
    pub startup: TierParams,
    pub aggregator: TierParams,
    pub unknown: TierParams,
    /// Cap applied when the URL carries campus/entry-level markers.
    pub campus_page_cap: usize,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            top_tier: TierParams {
                page_cap: 5,
                page_delay: Duration::from_secs(4),
            },
            mid_tier: TierParams {
                page_cap: 3,
                page_delay: Duration::from_millis(1500),
            },
            services: TierParams {
                page_cap: 4,
                page_delay: Duration::from_millis(1500),
            },
            startup: TierParams {
                page_cap: 6,
                page_delay: Duration::from_millis(2500),
            },
            aggregator: TierParams {
                page_cap: 8,
                page_delay: Duration::from_millis(1500),
            },
            unknown: TierParams {
                page_cap: 3,
                page_delay: Duration::from_millis(1500),
            },
            campus_page_cap: 3,
        }
    }
}

impl TierTable {
    pub fn params_for(&self, target: &Target) -> TierParams {
        let mut params = match target.tier {
            TargetTier::TopTier => self.top_tier,
            TargetTier::MidTier => self.mid_tier,
            TargetTier::Services => self.services,
            TargetTier::Startup => self.startup,
            TargetTier::Aggregator => self.aggregator,
            TargetTier::Unknown => self.unknown,
        };

        let url = target.url.as_str().to_lowercase();
        if CAMPUS_KEYWORDS.iter().any(|kw| url.contains(kw)) {
            params.page_cap = params.page_cap.min(self.campus_page_cap);
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> Target {
        Target::classify(Url::parse(url).unwrap())
    }

    #[test]
    fn classifies_known_domains() {
        assert_eq!(target("https://careers.google.com/jobs").tier, TargetTier::TopTier);
        assert_eq!(target("https://careers.microsoft.com/").tier, TargetTier::MidTier);
        assert_eq!(target("https://www.tcs.com/careers").tier, TargetTier::Services);
        assert_eq!(target("https://wellfound.com/jobs").tier, TargetTier::Startup);
        assert_eq!(target("https://www.naukri.com/it-jobs").tier, TargetTier::Aggregator);
        assert_eq!(target("https://smallco.example.com/jobs").tier, TargetTier::Unknown);
    }

    #[test]
    fn page_caps_follow_the_table() {
        let table = TierTable::default();
        assert_eq!(table.params_for(&target("https://careers.google.com/")).page_cap, 5);
        assert_eq!(table.params_for(&target("https://www.naukri.com/")).page_cap, 8);
        assert_eq!(table.params_for(&target("https://wellfound.com/")).page_cap, 6);
        assert_eq!(table.params_for(&target("https://www.ibm.com/careers")).page_cap, 4);
        assert_eq!(table.params_for(&target("https://smallco.example.com/")).page_cap, 3);
    }

    #[test]
    fn campus_urls_get_the_reduced_cap() {
        let table = TierTable::default();
        let t = target("https://www.naukri.com/internship-jobs?tag=intern");
        assert_eq!(t.tier, TargetTier::Aggregator);
        assert_eq!(table.params_for(&t).page_cap, 3);
    }
}
