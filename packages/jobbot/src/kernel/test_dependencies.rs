// Mock implementations for testing
//
// Shipped as part of the library so both unit tests and the integration
// tests under tests/ can inject them.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use super::{BaseAI, BaseRenderer, RenderedPage};
use crate::extract::{FitAssessment, FitScorer, ListingExtractor, ListingPage};
use crate::models::UserProfile;

// =============================================================================
// Mock AI
// =============================================================================

/// Scripted BaseAI: responses are returned in order, then a default empty
/// object. All prompts are recorded.
pub struct MockAI {
    responses: Arc<Mutex<Vec<String>>>,
    error: Arc<Mutex<Option<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: &str) -> Self {
        self.responses.lock().unwrap().push(response.to_string());
        self
    }

    /// Fail every call with the given message (e.g. a rate-limit signal).
    pub fn with_error(self, message: &str) -> Self {
        *self.error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(message) = self.error.lock().unwrap().as_ref() {
            anyhow::bail!("{}", message);
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("{}".to_string())
        } else {
            Ok(responses.remove(0))
        }
    }
}

// =============================================================================
// Mock Renderer
// =============================================================================

/// Map-backed renderer: URLs without a scripted page fail, like a
/// navigation that never loads.
pub struct MockRenderer {
    pages: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            pages: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_page(self, url: &str, markdown: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), markdown.to_string());
        self
    }

    /// All URLs that were rendered, in order (retries included).
    pub fn render_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_rendered(&self, url: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|u| u == url)
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRenderer for MockRenderer {
    async fn render(&self, url: &str, _timeout: Duration) -> Result<RenderedPage> {
        self.calls.lock().unwrap().push(url.to_string());

        let pages = self.pages.lock().unwrap();
        match pages.get(url) {
            Some(markdown) => Ok(RenderedPage {
                url: url.to_string(),
                markdown: markdown.clone(),
                title: Some(format!("Page: {}", url)),
            }),
            None => anyhow::bail!("Navigation failed for {}", url),
        }
    }
}

// =============================================================================
// Mock Listing Extractor
// =============================================================================

/// Listing pages keyed by page URL; unknown pages extract nothing.
pub struct MockListingExtractor {
    pages: Arc<Mutex<HashMap<String, ListingPage>>>,
}

impl MockListingExtractor {
    pub fn new() -> Self {
        Self {
            pages: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_page(self, url: &str, page: ListingPage) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), page);
        self
    }
}

impl Default for MockListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingExtractor for MockListingExtractor {
    async fn extract_listings(
        &self,
        _page_markdown: &str,
        base_url: &Url,
        _page_number: usize,
    ) -> Result<ListingPage> {
        let pages = self.pages.lock().unwrap();
        Ok(pages.get(base_url.as_str()).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Mock Fit Scorer
// =============================================================================

/// Fixed-assessment scorer for pipeline tests.
pub struct MockFitScorer {
    assessment: FitAssessment,
}

impl MockFitScorer {
    pub fn new() -> Self {
        Self {
            assessment: FitAssessment {
                match_score: 7,
                match_summary: "Mock assessment".to_string(),
                matching_skills: vec!["rust".to_string()],
                missing_skills: Vec::new(),
                salary_range: None,
                company_info: None,
            },
        }
    }

    pub fn with_assessment(mut self, assessment: FitAssessment) -> Self {
        self.assessment = assessment;
        self
    }
}

impl Default for MockFitScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FitScorer for MockFitScorer {
    async fn score(&self, _profile: &UserProfile, _job_text: &str) -> Result<FitAssessment> {
        Ok(self.assessment.clone())
    }
}
