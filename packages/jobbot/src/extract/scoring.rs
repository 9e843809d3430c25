//! Fit scoring: one scoring contract, two implementations.
//!
//! `LlmFitScorer` asks the extraction service for a rubric-driven
//! assessment and validates the response shape. `KeywordFitScorer` is the
//! deterministic fallback. `FallbackFitScorer` composes the two behind the
//! shared contract, with a cooldown pause when the service signals a rate
//! limit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::is_rate_limit_error;
use super::json::{clip, extract_json_object};
use crate::kernel::BaseAI;
use crate::models::UserProfile;

/// Job descriptions are clipped to this many characters before prompting.
const JOB_CONTENT_BUDGET: usize = 4_000;

/// A validated service response with this many missing required skills is
/// capped regardless of the score it claims.
const MISSING_SKILLS_CAP_THRESHOLD: usize = 3;
const MISSING_SKILLS_CAP: i32 = 4;

/// Seniority markers that cap the fallback score for an entry-level profile.
const SENIORITY_KEYWORDS: [&str; 4] = ["senior", "lead", "staff", "principal"];

/// Structured fit assessment for one job posting.
#[derive(Debug, Clone, Deserialize)]
pub struct FitAssessment {
    pub match_score: i32,
    pub match_summary: String,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub company_info: Option<serde_json::Value>,
}

#[async_trait]
pub trait FitScorer: Send + Sync {
    /// Score a job description against the candidate profile, 1-10.
    async fn score(&self, profile: &UserProfile, job_text: &str) -> Result<FitAssessment>;
}

// =============================================================================
// LLM-backed scorer
// =============================================================================

pub struct LlmFitScorer<A: BaseAI> {
    ai: A,
}

impl<A: BaseAI> LlmFitScorer<A> {
    pub fn new(ai: A) -> Self {
        Self { ai }
    }

    fn build_prompt(profile: &UserProfile, job_text: &str) -> String {
        format!(
            r#"Analyze this job for the candidate. Return JSON format.

Score strictly, 1-10. Hard caps:
- If the role requires a higher education level than the candidate has, cap match_score at 3.
- If the role requires more years of experience than the candidate has, cap match_score at 3.
- If the candidate is missing 3 or more required skills, cap match_score at 4.

CANDIDATE:
Summary: {summary}
Skills: {skills}
Experience: {experience}

JOB DESCRIPTION:
{job}

Return JSON:
{{
    "match_score": 7,
    "match_summary": "Good match because candidate has relevant experience...",
    "matching_skills": ["Python", "Django", "React"],
    "missing_skills": ["Kubernetes", "AWS"],
    "salary_range": "80k-120k USD",
    "company_info": {{"industry": "Technology", "size": "Large"}}
}}"#,
            summary = clip(profile.summary.as_deref().unwrap_or("N/A"), 400),
            skills = clip(profile.skills.as_deref().unwrap_or("N/A"), 300),
            experience = clip(profile.experience.as_deref().unwrap_or("N/A"), 200),
            job = clip(job_text, JOB_CONTENT_BUDGET),
        )
    }

    /// Validation gate. Unlike listing extraction, a malformed assessment is
    /// an error here so the composite scorer can fall back.
    fn parse_response(raw: &str) -> Result<FitAssessment> {
        let json = extract_json_object(raw)
            .context("No JSON object in fit assessment response")?;

        let mut assessment: FitAssessment =
            serde_json::from_str(json).context("Malformed fit assessment response")?;

        if assessment.match_summary.trim().is_empty() {
            anyhow::bail!("Fit assessment missing summary");
        }

        assessment.match_score = assessment.match_score.clamp(1, 10);

        // Deterministic enforcement of the rubric ceiling: the service is
        // told about the cap but cannot be trusted to apply it.
        if assessment.missing_skills.len() >= MISSING_SKILLS_CAP_THRESHOLD {
            assessment.match_score = assessment.match_score.min(MISSING_SKILLS_CAP);
        }

        Ok(assessment)
    }
}

#[async_trait]
impl<A: BaseAI> FitScorer for LlmFitScorer<A> {
    async fn score(&self, profile: &UserProfile, job_text: &str) -> Result<FitAssessment> {
        let prompt = Self::build_prompt(profile, job_text);
        let raw = self.ai.complete(&prompt).await?;
        Self::parse_response(&raw)
    }
}

// =============================================================================
// Deterministic keyword fallback
// =============================================================================

pub struct KeywordFitScorer;

#[async_trait]
impl FitScorer for KeywordFitScorer {
    async fn score(&self, profile: &UserProfile, job_text: &str) -> Result<FitAssessment> {
        let content = job_text.to_lowercase();
        let skills = profile.skill_list();

        let matching_skills: Vec<String> = skills
            .iter()
            .filter(|skill| content.contains(skill.as_str()))
            .cloned()
            .collect();

        let mut score = match matching_skills.len() {
            n if n >= 3 => 8,
            2 => 6,
            1 => 4,
            _ => 3,
        };

        if SENIORITY_KEYWORDS.iter().any(|kw| content.contains(kw)) {
            score = score.min(3);
        }

        Ok(FitAssessment {
            match_score: score,
            match_summary: format!(
                "Skill alignment analysis: {} matches found",
                matching_skills.len()
            ),
            matching_skills,
            missing_skills: Vec::new(),
            salary_range: None,
            company_info: None,
        })
    }
}

// =============================================================================
// Composite: LLM first, keyword fallback, cooldown on rate limits
// =============================================================================

pub struct FallbackFitScorer<A: BaseAI> {
    llm: LlmFitScorer<A>,
    keyword: KeywordFitScorer,
    rate_limit_cooldown: Duration,
}

impl<A: BaseAI> FallbackFitScorer<A> {
    pub fn new(ai: A) -> Self {
        Self {
            llm: LlmFitScorer::new(ai),
            keyword: KeywordFitScorer,
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }
}

#[async_trait]
impl<A: BaseAI> FitScorer for FallbackFitScorer<A> {
    async fn score(&self, profile: &UserProfile, job_text: &str) -> Result<FitAssessment> {
        match self.llm.score(profile, job_text).await {
            Ok(assessment) => Ok(assessment),
            Err(e) if is_rate_limit_error(&e) => {
                warn!(
                    cooldown_secs = self.rate_limit_cooldown.as_secs(),
                    "Extraction service rate limited, cooling down"
                );
                tokio::time::sleep(self.rate_limit_cooldown).await;

                match self.llm.score(profile, job_text).await {
                    Ok(assessment) => Ok(assessment),
                    Err(e) => {
                        warn!(error = %e, "Fit scoring still failing after cooldown, using fallback");
                        self.keyword.score(profile, job_text).await
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "LLM fit scoring failed, using fallback");
                self.keyword.score(profile, job_text).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockAI;
    use uuid::Uuid;

    fn profile(skills: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            full_name: None,
            summary: Some("Entry-level engineer".to_string()),
            experience: None,
            education: None,
            projects: None,
            skills: Some(skills.to_string()),
        }
    }

    #[tokio::test]
    async fn llm_scorer_caps_on_missing_skills() {
        let ai = MockAI::new().with_response(
            r#"{"match_score": 9, "match_summary": "Strong match",
                "matching_skills": ["Python"],
                "missing_skills": ["Kubernetes", "AWS", "Terraform"]}"#,
        );
        let scorer = LlmFitScorer::new(ai);

        let assessment = scorer.score(&profile("python"), "job text").await.unwrap();
        assert_eq!(assessment.match_score, 4);
    }

    #[tokio::test]
    async fn llm_scorer_clamps_out_of_range_scores() {
        let ai = MockAI::new()
            .with_response(r#"{"match_score": 42, "match_summary": "sure"}"#);
        let scorer = LlmFitScorer::new(ai);

        let assessment = scorer.score(&profile("python"), "job text").await.unwrap();
        assert_eq!(assessment.match_score, 10);
    }

    #[tokio::test]
    async fn keyword_scorer_bands() {
        let scorer = KeywordFitScorer;
        let p = profile("python, django, react, sql");

        let high = scorer
            .score(&p, "We use Python, Django and React daily")
            .await
            .unwrap();
        assert_eq!(high.match_score, 8);
        assert_eq!(high.matching_skills.len(), 3);

        let low = scorer.score(&p, "COBOL mainframe role").await.unwrap();
        assert_eq!(low.match_score, 3);
    }

    #[tokio::test]
    async fn keyword_scorer_seniority_ceiling() {
        let scorer = KeywordFitScorer;
        let p = profile("python, django, react");

        let assessment = scorer
            .score(&p, "Senior engineer role: Python, Django, React required")
            .await
            .unwrap();
        assert_eq!(assessment.match_score, 3);
    }

    #[tokio::test]
    async fn fallback_scorer_degrades_on_malformed_output() {
        let ai = MockAI::new().with_response("not json at all");
        let scorer = FallbackFitScorer::new(ai);
        let p = profile("python, sql");

        let assessment = scorer
            .score(&p, "Python and SQL position")
            .await
            .unwrap();
        // Keyword fallback: 2 matches
        assert_eq!(assessment.match_score, 6);
    }
}
