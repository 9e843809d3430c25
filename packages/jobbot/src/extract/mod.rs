pub mod json;
pub mod listings;
pub mod scoring;

pub use listings::{ListingExtractor, ListingJob, ListingPage, LlmListingExtractor};
pub use scoring::{FallbackFitScorer, FitAssessment, FitScorer, KeywordFitScorer, LlmFitScorer};

/// Check if an error looks like a rate-limit signal from the extraction
/// service. Rate limits get a long cooldown pause instead of a fallback.
pub fn is_rate_limit_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string().to_lowercase();
    error_str.contains("429")
        || error_str.contains("rate limit")
        || error_str.contains("rate_limit")
        || error_str.contains("too many requests")
}
