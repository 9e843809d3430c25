pub mod pagination;
pub mod state;
pub mod tiers;

pub use pagination::{crawl_target, Candidate, CrawlerTuning, TargetCrawl};
pub use state::{CrawlState, PageDecision, StopReason};
pub use tiers::{Target, TargetTier, TierParams, TierTable};
