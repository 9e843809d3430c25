// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Prompt construction and response parsing live in the extract modules.

pub mod ai;
pub mod renderer;
pub mod test_dependencies;

pub use ai::OpenAIClient;
pub use renderer::BrowserRenderer;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response).
    /// Output may be malformed - callers must validate and fall back.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

// =============================================================================
// Renderer Trait (Infrastructure - headless page rendering)
// =============================================================================

/// Extracted text for one rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub markdown: String,
    pub title: Option<String>,
}

#[async_trait]
pub trait BaseRenderer: Send + Sync {
    /// Render a URL through the headless browser service and return the
    /// extracted page text. Failure is a retryable condition; retry policy
    /// belongs to the caller.
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage>;
}
