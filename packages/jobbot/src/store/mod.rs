pub mod memory;
pub mod postgres;

pub use memory::MemoryJobStore;
pub use postgres::PostgresJobStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{
    BatchInsertOutcome, JobRecord, JobStatus, NewJobRecord, UpsertOutcome, UserProfile,
};

/// Score constraint inside a `JobPredicate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreFilter {
    #[default]
    Any,
    Below(i32),
    /// Inclusive range.
    Between(i32, i32),
    AtLeast(i32),
    /// Outside the inclusive range.
    Outside(i32, i32),
}

impl ScoreFilter {
    pub fn matches(&self, score: i32) -> bool {
        match *self {
            ScoreFilter::Any => true,
            ScoreFilter::Below(n) => score < n,
            ScoreFilter::Between(lo, hi) => score >= lo && score <= hi,
            ScoreFilter::AtLeast(n) => score >= n,
            ScoreFilter::Outside(lo, hi) => score < lo || score > hi,
        }
    }
}

/// Typed predicate for `count_where` / `delete_where`.
///
/// An empty status list matches any status - retention rules always carry
/// explicit statuses, enforced by the engine.
#[derive(Debug, Clone, Default)]
pub struct JobPredicate {
    pub statuses: Vec<JobStatus>,
    pub score: ScoreFilter,
    pub found_before: Option<DateTime<Utc>>,
}

impl JobPredicate {
    pub fn matches(&self, job: &JobRecord) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&job.status) {
            return false;
        }
        if !self.score.matches(job.match_score) {
            return false;
        }
        if let Some(cutoff) = self.found_before {
            if job.date_found >= cutoff {
                return false;
            }
        }
        true
    }
}

/// Persistence contract for the campaign pipeline and the retention engine.
///
/// The store is an external collaborator: existence checks, race-safe
/// upserts and predicate deletes. Nothing in here interprets scores or
/// retention policy.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// The configured candidate profile, if any.
    async fn load_profile(&self) -> Result<Option<UserProfile>>;

    /// Which of these URLs already have a record.
    async fn filter_existing(&self, urls: &[String]) -> Result<HashSet<String>>;

    /// Race-safe insert: an existing URL is a duplicate, not an error.
    async fn insert_if_absent(&self, job: NewJobRecord) -> Result<UpsertOutcome>;

    /// Insert a batch in one transaction.
    async fn insert_batch(&self, jobs: Vec<NewJobRecord>) -> Result<BatchInsertOutcome>;

    async fn count_where(&self, predicate: &JobPredicate) -> Result<i64>;

    /// Delete matching records atomically, returning the count.
    async fn delete_where(&self, predicate: &JobPredicate) -> Result<u64>;

    /// URLs that have more than one record.
    async fn duplicate_urls(&self) -> Result<Vec<String>>;

    async fn jobs_for_url(&self, url: &str) -> Result<Vec<JobRecord>>;

    /// Distinct company names.
    async fn companies(&self) -> Result<Vec<String>>;

    async fn jobs_for_company(&self, company: &str) -> Result<Vec<JobRecord>>;

    /// Delete specific records atomically, returning the count.
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_filter_semantics() {
        assert!(ScoreFilter::Below(3).matches(2));
        assert!(!ScoreFilter::Below(3).matches(3));
        assert!(ScoreFilter::Between(3, 4).matches(4));
        assert!(!ScoreFilter::Between(3, 4).matches(5));
        assert!(ScoreFilter::AtLeast(8).matches(8));
        assert!(ScoreFilter::Outside(8, 10).matches(7));
        assert!(!ScoreFilter::Outside(8, 10).matches(9));
    }
}
