//! Retention policy: the named rules, the company quota and the ordering
//! configuration that bound the job store's size.

pub mod engine;

pub use engine::{CleanupReport, CleanupStats, RetentionEngine};

use chrono::{DateTime, Duration, Utc};

use crate::models::JobStatus;
use crate::store::{JobPredicate, ScoreFilter};

/// One named age/score retention rule.
///
/// Statuses are always explicit: a rule states exactly which lifecycle
/// states it may touch.
#[derive(Debug, Clone)]
pub struct RetentionRule {
    pub name: String,
    pub statuses: Vec<JobStatus>,
    pub score: ScoreFilter,
    pub max_age_days: i64,
}

impl RetentionRule {
    pub fn new(
        name: &str,
        statuses: Vec<JobStatus>,
        score: ScoreFilter,
        max_age_days: i64,
    ) -> Self {
        Self {
            name: name.to_string(),
            statuses,
            score,
            max_age_days,
        }
    }

    /// The store predicate for this rule at the given moment, restricted to
    /// the statuses the caller allows.
    pub fn predicate(&self, now: DateTime<Utc>, allowed: Vec<JobStatus>) -> JobPredicate {
        JobPredicate {
            statuses: allowed,
            score: self.score,
            found_before: Some(now - Duration::days(self.max_age_days)),
        }
    }
}

/// Sort key for the company-quota ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    ScoreDesc,
    RecencyDesc,
}

/// The whole retention configuration.
///
/// The duplicate tie-break order and the quota ranking are policy, not
/// constants: the defaults reproduce the historical behavior (Applied over
/// Interested over recency; score before recency) but deployments can
/// reorder them.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub rules: Vec<RetentionRule>,
    /// Statuses no rule may ever delete.
    pub protected_statuses: Vec<JobStatus>,
    /// Keep at most this many records per company.
    pub max_jobs_per_company: usize,
    /// Only these statuses may be removed by the company quota.
    pub quota_deletable: Vec<JobStatus>,
    /// Duplicate consolidation keeps the earliest status in this list;
    /// unlisted statuses rank after all listed ones, ties go to recency.
    pub duplicate_precedence: Vec<JobStatus>,
    /// Ranking used to pick which records a company keeps.
    pub quota_ranking: Vec<RankKey>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                RetentionRule::new(
                    "very-low-match",
                    vec![JobStatus::New],
                    ScoreFilter::Below(3),
                    7,
                ),
                RetentionRule::new(
                    "low-match",
                    vec![JobStatus::New],
                    ScoreFilter::Between(3, 4),
                    14,
                ),
                RetentionRule::new(
                    "standard",
                    vec![JobStatus::New],
                    ScoreFilter::Outside(8, 10),
                    30,
                ),
                RetentionRule::new(
                    "viewed-aged",
                    vec![JobStatus::Viewed],
                    ScoreFilter::Any,
                    45,
                ),
                RetentionRule::new(
                    "high-match-aged",
                    vec![JobStatus::New, JobStatus::Viewed],
                    ScoreFilter::AtLeast(8),
                    60,
                ),
            ],
            protected_statuses: vec![JobStatus::Applied],
            max_jobs_per_company: 15,
            quota_deletable: vec![JobStatus::New],
            duplicate_precedence: vec![JobStatus::Applied, JobStatus::Interested],
            quota_ranking: vec![RankKey::ScoreDesc, RankKey::RecencyDesc],
        }
    }
}
