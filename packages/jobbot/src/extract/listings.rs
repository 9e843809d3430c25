//! Listing extraction: one rendered listing page in, job links and the next
//! pagination link out.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::json::{clip, extract_json_object};
use crate::kernel::BaseAI;

/// Listing pages are clipped to this many characters before prompting.
const LISTING_CONTENT_BUDGET: usize = 12_000;

/// One job link as reported by the extraction service. URLs here may still
/// be relative; the crawler resolves them against the page URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingJob {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: String,
}

/// Structured result for one listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub jobs: Vec<ListingJob>,
    #[serde(default)]
    pub next_page_url: Option<String>,
}

#[async_trait]
pub trait ListingExtractor: Send + Sync {
    /// Extract job listings and the pagination link from a rendered page.
    /// Malformed service output is not an error: it produces an empty page.
    async fn extract_listings(
        &self,
        page_markdown: &str,
        base_url: &Url,
        page_number: usize,
    ) -> Result<ListingPage>;
}

/// Extraction service backed by the LLM.
pub struct LlmListingExtractor<A: BaseAI> {
    ai: A,
}

impl<A: BaseAI> LlmListingExtractor<A> {
    pub fn new(ai: A) -> Self {
        Self { ai }
    }

    fn build_prompt(page_markdown: &str, base_url: &Url, page_number: usize) -> String {
        format!(
            r#"Extract job listings and pagination from this webpage. Return ONLY valid JSON.

Current page: {base}
Page {page} in sequence

Extract:
1. Job listings with title, company, location, and job detail URL
2. Next page URL (look for "Next", page numbers, "Load More", "View More Jobs")

Make all URLs absolute using base: {base}

Return JSON format:
{{
    "jobs": [
        {{"title": "Software Engineer", "company": "Company Name", "location": "City, State", "url": "https://absolute-job-url"}}
    ],
    "next_page_url": "https://absolute-next-page-url-or-null"
}}

WEBPAGE CONTENT:
{content}"#,
            base = base_url,
            page = page_number,
            content = clip(page_markdown, LISTING_CONTENT_BUDGET),
        )
    }

    /// Validation gate: malformed output degrades to an empty page rather
    /// than failing the crawl.
    fn parse_response(raw: &str) -> ListingPage {
        let Some(json) = extract_json_object(raw) else {
            warn!("No JSON object in listing extraction response");
            return ListingPage::default();
        };

        let mut page: ListingPage = match serde_json::from_str(json) {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Malformed listing extraction response");
                return ListingPage::default();
            }
        };

        // The service must name title, company and a detail URL for a
        // listing to be usable downstream.
        page.jobs
            .retain(|job| !job.title.is_empty() && !job.company.is_empty() && !job.url.is_empty());

        page.next_page_url = page
            .next_page_url
            .filter(|next| !next.trim().is_empty() && next.trim() != "null");

        page
    }
}

#[async_trait]
impl<A: BaseAI> ListingExtractor for LlmListingExtractor<A> {
    async fn extract_listings(
        &self,
        page_markdown: &str,
        base_url: &Url,
        page_number: usize,
    ) -> Result<ListingPage> {
        let prompt = Self::build_prompt(page_markdown, base_url, page_number);
        let raw = self.ai.complete(&prompt).await?;
        let page = Self::parse_response(&raw);

        debug!(
            url = %base_url,
            jobs = page.jobs.len(),
            has_next = page.next_page_url.is_some(),
            "Listing extraction completed"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockAI;

    #[tokio::test]
    async fn extracts_jobs_and_next_link() {
        let ai = MockAI::new().with_response(
            r#"{"jobs": [
                {"title": "Backend Engineer", "company": "Acme", "location": "Remote", "url": "/job/1"},
                {"title": "", "company": "Acme", "url": "/job/2"}
            ], "next_page_url": "/careers?page=2"}"#,
        );
        let extractor = LlmListingExtractor::new(ai);
        let base = Url::parse("https://acme.com/careers").unwrap();

        let page = extractor.extract_listings("content", &base, 1).await.unwrap();

        // The listing without a title is dropped by the gate
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].url, "/job/1");
        assert_eq!(page.next_page_url.as_deref(), Some("/careers?page=2"));
    }

    #[tokio::test]
    async fn malformed_response_yields_empty_page() {
        let ai = MockAI::new().with_response("I could not find any structured data, sorry.");
        let extractor = LlmListingExtractor::new(ai);
        let base = Url::parse("https://acme.com/careers").unwrap();

        let page = extractor.extract_listings("content", &base, 1).await.unwrap();

        assert!(page.jobs.is_empty());
        assert!(page.next_page_url.is_none());
    }

    #[tokio::test]
    async fn literal_null_next_page_is_none() {
        let ai = MockAI::new()
            .with_response(r#"{"jobs": [], "next_page_url": "null"}"#);
        let extractor = LlmListingExtractor::new(ai);
        let base = Url::parse("https://acme.com/careers").unwrap();

        let page = extractor.extract_listings("content", &base, 3).await.unwrap();
        assert!(page.next_page_url.is_none());
    }
}
