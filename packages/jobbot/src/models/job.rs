use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a stored job.
///
/// New → Viewed → Interested/Applied as the user works through the board;
/// "Not Interested" is terminal. The string spellings match the `job_status`
/// Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status")]
pub enum JobStatus {
    New,
    Viewed,
    Interested,
    Applied,
    #[sqlx(rename = "Not Interested")]
    #[serde(rename = "Not Interested")]
    NotInterested,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::New,
        JobStatus::Viewed,
        JobStatus::Interested,
        JobStatus::Applied,
        JobStatus::NotInterested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "New",
            JobStatus::Viewed => "Viewed",
            JobStatus::Interested => "Interested",
            JobStatus::Applied => "Applied",
            JobStatus::NotInterested => "Not Interested",
        }
    }
}

/// A persisted, scored job posting.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: Uuid,
    pub date_found: DateTime<Utc>,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: String,
    pub status: JobStatus,
    pub raw_description: Option<String>,
    pub match_score: i32,
    pub match_summary: Option<String>,
    pub matching_skills: Option<serde_json::Value>,
    pub missing_skills: Option<serde_json::Value>,
    pub salary_range: Option<String>,
    pub company_info: Option<serde_json::Value>,
}

/// Insert shape produced by deep analysis. Status starts at New and the
/// discovery timestamp is assigned at insert time.
#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub raw_description: String,
    pub match_score: i32,
    pub match_summary: String,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub salary_range: Option<String>,
    pub company_info: Option<serde_json::Value>,
}

/// Outcome of a race-safe insert: a second writer for the same URL is a
/// duplicate, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchInsertOutcome {
    pub inserted: usize,
    pub duplicates: usize,
}
