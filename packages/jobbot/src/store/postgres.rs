//! Postgres implementation of the job store.
//!
//! All SQL lives here. Predicates are rendered with `QueryBuilder` so the
//! retention engine's typed rules translate to single atomic statements.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{
    BatchInsertOutcome, JobRecord, NewJobRecord, UpsertOutcome, UserProfile,
};

use super::{JobPredicate, JobStore, ScoreFilter};

pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &JobPredicate) {
        builder.push(" WHERE TRUE");

        if !predicate.statuses.is_empty() {
            builder.push(" AND status IN (");
            let mut statuses = builder.separated(", ");
            for status in &predicate.statuses {
                statuses.push_bind(*status);
            }
            statuses.push_unseparated(")");
        }

        match predicate.score {
            ScoreFilter::Any => {}
            ScoreFilter::Below(n) => {
                builder.push(" AND match_score < ").push_bind(n);
            }
            ScoreFilter::Between(lo, hi) => {
                builder
                    .push(" AND match_score BETWEEN ")
                    .push_bind(lo)
                    .push(" AND ")
                    .push_bind(hi);
            }
            ScoreFilter::AtLeast(n) => {
                builder.push(" AND match_score >= ").push_bind(n);
            }
            ScoreFilter::Outside(lo, hi) => {
                builder
                    .push(" AND match_score NOT BETWEEN ")
                    .push_bind(lo)
                    .push(" AND ")
                    .push_bind(hi);
            }
        }

        if let Some(cutoff) = predicate.found_before {
            builder.push(" AND date_found < ").push_bind(cutoff);
        }
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn load_profile(&self) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profile ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user profile")?;
        Ok(profile)
    }

    async fn filter_existing(&self, urls: &[String]) -> Result<HashSet<String>> {
        let existing: Vec<String> =
            sqlx::query_scalar("SELECT url FROM jobs WHERE url = ANY($1)")
                .bind(urls)
                .fetch_all(&self.pool)
                .await
                .context("Failed to check existing urls")?;
        Ok(existing.into_iter().collect())
    }

    async fn insert_if_absent(&self, job: NewJobRecord) -> Result<UpsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                id, date_found, title, company, location, url, status,
                raw_description, match_score, match_summary,
                matching_skills, missing_skills, salary_range, company_info
            ) VALUES ($1, $2, $3, $4, $5, $6, 'New', $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(Utc::now())
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.url)
        .bind(&job.raw_description)
        .bind(job.match_score)
        .bind(&job.match_summary)
        .bind(serde_json::json!(job.matching_skills))
        .bind(serde_json::json!(job.missing_skills))
        .bind(&job.salary_range)
        .bind(&job.company_info)
        .execute(&self.pool)
        .await
        .context("Failed to insert job")?;

        if result.rows_affected() == 1 {
            Ok(UpsertOutcome::Inserted)
        } else {
            Ok(UpsertOutcome::Duplicate)
        }
    }

    async fn insert_batch(&self, jobs: Vec<NewJobRecord>) -> Result<BatchInsertOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut outcome = BatchInsertOutcome::default();

        for job in jobs {
            let result = sqlx::query(
                r#"
                INSERT INTO jobs (
                    id, date_found, title, company, location, url, status,
                    raw_description, match_score, match_summary,
                    matching_skills, missing_skills, salary_range, company_info
                ) VALUES ($1, $2, $3, $4, $5, $6, 'New', $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (url) DO NOTHING
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(Utc::now())
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(&job.url)
            .bind(&job.raw_description)
            .bind(job.match_score)
            .bind(&job.match_summary)
            .bind(serde_json::json!(job.matching_skills))
            .bind(serde_json::json!(job.missing_skills))
            .bind(&job.salary_range)
            .bind(&job.company_info)
            .execute(&mut *tx)
            .await
            .context("Failed to insert job in batch")?;

            if result.rows_affected() == 1 {
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }

        tx.commit().await.context("Failed to commit job batch")?;
        Ok(outcome)
    }

    async fn count_where(&self, predicate: &JobPredicate) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM jobs");
        Self::push_predicate(&mut builder, predicate);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count jobs")?;
        Ok(count)
    }

    async fn delete_where(&self, predicate: &JobPredicate) -> Result<u64> {
        let mut builder = QueryBuilder::new("DELETE FROM jobs");
        Self::push_predicate(&mut builder, predicate);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to delete jobs")?;
        Ok(result.rows_affected())
    }

    async fn duplicate_urls(&self) -> Result<Vec<String>> {
        let urls = sqlx::query_scalar(
            "SELECT url FROM jobs GROUP BY url HAVING COUNT(*) > 1",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list duplicate urls")?;
        Ok(urls)
    }

    async fn jobs_for_url(&self, url: &str) -> Result<Vec<JobRecord>> {
        let jobs = sqlx::query_as::<_, JobRecord>("SELECT * FROM jobs WHERE url = $1")
            .bind(url)
            .fetch_all(&self.pool)
            .await
            .context("Failed to load jobs for url")?;
        Ok(jobs)
    }

    async fn companies(&self) -> Result<Vec<String>> {
        let companies = sqlx::query_scalar("SELECT DISTINCT company FROM jobs")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list companies")?;
        Ok(companies)
    }

    async fn jobs_for_company(&self, company: &str) -> Result<Vec<JobRecord>> {
        let jobs = sqlx::query_as::<_, JobRecord>("SELECT * FROM jobs WHERE company = $1")
            .bind(company)
            .fetch_all(&self.pool)
            .await
            .context("Failed to load jobs for company")?;
        Ok(jobs)
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM jobs WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .context("Failed to delete jobs by id")?;
        Ok(result.rows_affected())
    }
}
