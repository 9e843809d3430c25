//! The cleanup engine: applies the retention policy to the store and
//! reports what it removed, per rule.
//!
//! Runs on a schedule, independent of campaigns. Each stage commits its
//! deletions atomically and a stage failure never blocks the stages after
//! it.

use anyhow::Result;
use chrono::Utc;
use std::cmp::Ordering;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{JobRecord, JobStatus};
use crate::store::{JobPredicate, JobStore, ScoreFilter};

use super::{RankKey, RetentionPolicy};

/// Store shape snapshot taken before and after a run.
#[derive(Debug, Clone, Default)]
pub struct CleanupStats {
    pub total: i64,
    pub by_status: Vec<(JobStatus, i64)>,
    pub high_match: i64,
    pub medium_match: i64,
    pub low_match: i64,
}

/// Per-rule breakdown of one cleanup run.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub pre: CleanupStats,
    pub post: CleanupStats,
    pub duplicates_removed: u64,
    pub rule_removals: Vec<(String, u64)>,
    pub quota_removed: u64,
    pub dry_run: bool,
}

impl CleanupReport {
    pub fn total_removed(&self) -> u64 {
        self.duplicates_removed
            + self.quota_removed
            + self.rule_removals.iter().map(|(_, n)| n).sum::<u64>()
    }
}

pub struct RetentionEngine<S: JobStore> {
    store: S,
    policy: RetentionPolicy,
}

impl<S: JobStore> RetentionEngine<S> {
    pub fn new(store: S, policy: RetentionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply the full policy: duplicate consolidation, age/score rules,
    /// company quota. Idempotent - a second run against an unchanged store
    /// removes nothing.
    pub async fn run_cleanup(&self) -> Result<CleanupReport> {
        self.execute(false).await
    }

    /// Compute the same counts without deleting anything.
    pub async fn preview(&self) -> Result<CleanupReport> {
        self.execute(true).await
    }

    async fn execute(&self, dry_run: bool) -> Result<CleanupReport> {
        let mut report = CleanupReport {
            dry_run,
            ..Default::default()
        };

        report.pre = self.stats().await?;
        info!(
            total = report.pre.total,
            high_match = report.pre.high_match,
            medium_match = report.pre.medium_match,
            low_match = report.pre.low_match,
            dry_run,
            "Starting cleanup"
        );

        if report.pre.total == 0 {
            info!("Store empty, no cleanup required");
            report.post = report.pre.clone();
            return Ok(report);
        }

        // Duplicates first so the age rules see one record per URL.
        match self.consolidate_duplicates(dry_run).await {
            Ok(n) => report.duplicates_removed = n,
            Err(e) => warn!(error = %e, "Duplicate consolidation failed"),
        }

        let now = Utc::now();
        for rule in &self.policy.rules {
            // Structural protection: engaged statuses are stripped from
            // every rule, whatever the configuration says.
            let allowed: Vec<JobStatus> = rule
                .statuses
                .iter()
                .copied()
                .filter(|s| !self.policy.protected_statuses.contains(s))
                .collect();

            if allowed.is_empty() {
                warn!(rule = %rule.name, "Rule only matches protected statuses, skipping");
                continue;
            }

            let predicate = rule.predicate(now, allowed);
            let removed = if dry_run {
                self.store.count_where(&predicate).await.map(|n| n as u64)
            } else {
                self.store.delete_where(&predicate).await
            };

            match removed {
                Ok(n) => {
                    if n > 0 {
                        info!(rule = %rule.name, removed = n, dry_run, "Retention rule applied");
                    }
                    report.rule_removals.push((rule.name.clone(), n));
                }
                Err(e) => {
                    warn!(rule = %rule.name, error = %e, "Retention rule failed");
                    report.rule_removals.push((rule.name.clone(), 0));
                }
            }
        }

        match self.enforce_company_quota(dry_run).await {
            Ok(n) => report.quota_removed = n,
            Err(e) => warn!(error = %e, "Company quota enforcement failed"),
        }

        report.post = self.stats().await?;
        info!(
            pre_total = report.pre.total,
            post_total = report.post.total,
            removed = report.total_removed(),
            dry_run,
            "Cleanup complete"
        );

        Ok(report)
    }

    async fn stats(&self) -> Result<CleanupStats> {
        let any = JobPredicate::default();
        let total = self.store.count_where(&any).await?;

        let mut by_status = Vec::new();
        for status in JobStatus::ALL {
            let count = self
                .store
                .count_where(&JobPredicate {
                    statuses: vec![status],
                    ..Default::default()
                })
                .await?;
            if count > 0 {
                by_status.push((status, count));
            }
        }

        let score_count = |filter: ScoreFilter| {
            let predicate = JobPredicate {
                score: filter,
                ..Default::default()
            };
            async move { self.store.count_where(&predicate).await }
        };

        Ok(CleanupStats {
            total,
            by_status,
            high_match: score_count(ScoreFilter::AtLeast(8)).await?,
            medium_match: score_count(ScoreFilter::Between(5, 7)).await?,
            low_match: score_count(ScoreFilter::Below(5)).await?,
        })
    }

    /// Keep exactly one record per URL: best status by configured
    /// precedence, then newest. All deletions go in one statement.
    async fn consolidate_duplicates(&self, dry_run: bool) -> Result<u64> {
        let mut to_delete: Vec<Uuid> = Vec::new();

        for url in self.store.duplicate_urls().await? {
            let mut records = self.store.jobs_for_url(&url).await?;
            if records.len() < 2 {
                continue;
            }

            records.sort_by(|a, b| self.duplicate_order(a, b));
            for record in &records[1..] {
                to_delete.push(record.id);
            }
        }

        if to_delete.is_empty() {
            return Ok(0);
        }
        if dry_run {
            return Ok(to_delete.len() as u64);
        }
        self.store.delete_by_ids(&to_delete).await
    }

    /// Keep-priority ordering: listed statuses first, in list order;
    /// within a rank, newest discovery wins.
    fn duplicate_order(&self, a: &JobRecord, b: &JobRecord) -> Ordering {
        let rank = |record: &JobRecord| {
            self.policy
                .duplicate_precedence
                .iter()
                .position(|s| *s == record.status)
                .unwrap_or(self.policy.duplicate_precedence.len())
        };
        rank(a)
            .cmp(&rank(b))
            .then_with(|| b.date_found.cmp(&a.date_found))
    }

    /// Per company, keep the top N by the configured ranking; among the
    /// excess, delete only quota-deletable (New) records.
    async fn enforce_company_quota(&self, dry_run: bool) -> Result<u64> {
        let mut to_delete: Vec<Uuid> = Vec::new();

        for company in self.store.companies().await? {
            let mut records = self.store.jobs_for_company(&company).await?;
            if records.len() <= self.policy.max_jobs_per_company {
                continue;
            }

            records.sort_by(|a, b| self.quota_order(a, b));
            for record in &records[self.policy.max_jobs_per_company..] {
                if self.policy.quota_deletable.contains(&record.status) {
                    to_delete.push(record.id);
                }
            }

            info!(
                company = %company,
                total = records.len(),
                over_quota = records.len() - self.policy.max_jobs_per_company,
                "Company over job quota"
            );
        }

        if to_delete.is_empty() {
            return Ok(0);
        }
        if dry_run {
            return Ok(to_delete.len() as u64);
        }
        self.store.delete_by_ids(&to_delete).await
    }

    fn quota_order(&self, a: &JobRecord, b: &JobRecord) -> Ordering {
        for key in &self.policy.quota_ranking {
            let ordering = match key {
                RankKey::ScoreDesc => b.match_score.cmp(&a.match_score),
                RankKey::RecencyDesc => b.date_found.cmp(&a.date_found),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
