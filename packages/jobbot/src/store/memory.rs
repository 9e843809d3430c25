//! In-memory job store.
//!
//! Backs the test suite and local experiments: same contract as the
//! Postgres store, plus switches to inject the failures the pipeline must
//! survive (a failed existence batch, a failed insert transaction).

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    BatchInsertOutcome, JobRecord, JobStatus, NewJobRecord, UpsertOutcome, UserProfile,
};

use super::{JobPredicate, JobStore};

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<JobRecord>>,
    profile: Mutex<Option<UserProfile>>,
    fail_next_filter: Mutex<bool>,
    fail_next_batch: Mutex<bool>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        *self.profile.lock().unwrap() = Some(profile);
        self
    }

    /// Seed a record directly, bypassing the upsert path. Tests use this to
    /// set arbitrary statuses, scores and discovery dates.
    pub fn seed(&self, record: JobRecord) {
        self.jobs.lock().unwrap().push(record);
    }

    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.jobs.lock().unwrap().clone()
    }

    /// Make the next `filter_existing` call fail.
    pub fn fail_next_filter_existing(&self) {
        *self.fail_next_filter.lock().unwrap() = true;
    }

    /// Make the next `insert_batch` call fail before writing anything.
    pub fn fail_next_insert_batch(&self) {
        *self.fail_next_batch.lock().unwrap() = true;
    }

    fn record_from(new: NewJobRecord) -> JobRecord {
        JobRecord {
            id: Uuid::now_v7(),
            date_found: Utc::now(),
            title: new.title,
            company: new.company,
            location: new.location,
            url: new.url,
            status: JobStatus::New,
            raw_description: Some(new.raw_description),
            match_score: new.match_score,
            match_summary: Some(new.match_summary),
            matching_skills: Some(serde_json::json!(new.matching_skills)),
            missing_skills: Some(serde_json::json!(new.missing_skills)),
            salary_range: new.salary_range,
            company_info: new.company_info,
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn load_profile(&self) -> Result<Option<UserProfile>> {
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn filter_existing(&self, urls: &[String]) -> Result<HashSet<String>> {
        let mut fail = self.fail_next_filter.lock().unwrap();
        if *fail {
            *fail = false;
            anyhow::bail!("Simulated existence-check failure");
        }

        let jobs = self.jobs.lock().unwrap();
        Ok(urls
            .iter()
            .filter(|url| jobs.iter().any(|j| &j.url == *url))
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&self, job: NewJobRecord) -> Result<UpsertOutcome> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.iter().any(|j| j.url == job.url) {
            return Ok(UpsertOutcome::Duplicate);
        }
        jobs.push(Self::record_from(job));
        Ok(UpsertOutcome::Inserted)
    }

    async fn insert_batch(&self, batch: Vec<NewJobRecord>) -> Result<BatchInsertOutcome> {
        {
            let mut fail = self.fail_next_batch.lock().unwrap();
            if *fail {
                *fail = false;
                anyhow::bail!("Simulated batch-insert failure");
            }
        }

        let mut outcome = BatchInsertOutcome::default();
        let mut jobs = self.jobs.lock().unwrap();
        for job in batch {
            if jobs.iter().any(|j| j.url == job.url) {
                outcome.duplicates += 1;
            } else {
                jobs.push(Self::record_from(job));
                outcome.inserted += 1;
            }
        }
        Ok(outcome)
    }

    async fn count_where(&self, predicate: &JobPredicate) -> Result<i64> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().filter(|j| predicate.matches(j)).count() as i64)
    }

    async fn delete_where(&self, predicate: &JobPredicate) -> Result<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| !predicate.matches(j));
        Ok((before - jobs.len()) as u64)
    }

    async fn duplicate_urls(&self) -> Result<Vec<String>> {
        let jobs = self.jobs.lock().unwrap();
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for job in jobs.iter() {
            if !seen.insert(job.url.clone()) && !duplicates.contains(&job.url) {
                duplicates.push(job.url.clone());
            }
        }
        Ok(duplicates)
    }

    async fn jobs_for_url(&self, url: &str) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().filter(|j| j.url == url).cloned().collect())
    }

    async fn companies(&self) -> Result<Vec<String>> {
        let jobs = self.jobs.lock().unwrap();
        let mut companies = Vec::new();
        for job in jobs.iter() {
            if !companies.contains(&job.company) {
                companies.push(job.company.clone());
            }
        }
        Ok(companies)
    }

    async fn jobs_for_company(&self, company: &str) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .filter(|j| j.company == company)
            .cloned()
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| !ids.contains(&j.id));
        Ok((before - jobs.len()) as u64)
    }
}
