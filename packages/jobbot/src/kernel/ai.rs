// AI implementation using OpenAI via rig
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in the extract modules.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;

use super::BaseAI;

/// OpenAI implementation of BaseAI
#[derive(Clone)]
pub struct OpenAIClient {
    client: openai::Client,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = openai::Client::new(&api_key);
        Self { client, model }
    }
}

#[async_trait]
impl BaseAI for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_length = prompt.len(),
            model = %self.model,
            "Building OpenAI agent for completion"
        );

        let agent = self
            .client
            .agent(&self.model)
            .preamble("You are a job listing analyst. Respond with valid JSON only.")
            .max_tokens(2048)
            .build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    prompt_preview = %&prompt[..prompt.len().min(200)],
                    "OpenAI API call failed"
                );
                e
            })
            .context("Failed to call OpenAI API")?;

        tracing::debug!(
            response_length = response.len(),
            model = %self.model,
            "OpenAI API response received"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_complete() {
        let api_key = std::env::var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY must be set for integration tests");

        let client = OpenAIClient::new(api_key, "gpt-4o-mini".to_string());

        let response = client
            .complete("Return the JSON object {\"ok\": true} and nothing else.")
            .await
            .expect("AI completion should succeed");

        assert!(response.contains("ok"));
    }
}
