//! Rendering client backed by a headless browser service.
//!
//! The service fetches a URL with a real browser (JavaScript included) and
//! returns the final HTML. This client turns that HTML into LLM-ready
//! markdown:
//! - strips script/style/nav/footer and other boilerplate with `scraper`
//! - converts the remaining HTML to Markdown with `htmd`
//!
//! Limitations: a page whose rendered HTML is under MIN_HTML_CHARS is
//! reported as a failed render - interstitials and block pages come back
//! tiny, and passing them downstream would poison extraction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{BaseRenderer, RenderedPage};

/// Rendered HTML below this size is treated as a failed navigation.
const MIN_HTML_CHARS: usize = 1000;

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    html: String,
}

/// Client for the headless rendering service.
pub struct BrowserRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl BrowserRenderer {
    pub fn new(endpoint: String) -> Result<Self> {
        // Browser-like User-Agent: some career sites vary markup for bots
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }

    /// Extract title from HTML document
    fn extract_title(document: &Html) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;
        document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Remove common boilerplate elements from an HTML string
    fn remove_boilerplate(html: &str) -> String {
        let document = Html::parse_document(html);
        let unwanted = [
            "nav",
            "header",
            "footer",
            "aside",
            ".nav",
            ".navbar",
            ".header",
            ".footer",
            ".sidebar",
            ".menu",
            ".advertisement",
            ".ads",
            "#nav",
            "#header",
            "#footer",
            "#sidebar",
            "script",
            "style",
            "noscript",
            "iframe",
        ];

        let mut result = html.to_string();
        for selector_str in unwanted {
            if let Ok(selector) = Selector::parse(selector_str) {
                for element in document.select(&selector) {
                    let element_html = element.html();
                    result = result.replace(&element_html, "");
                }
            }
        }

        result
    }

    /// Convert HTML to Markdown
    fn html_to_markdown(html: &str) -> String {
        htmd::convert(html).unwrap_or_else(|_| {
            // Fallback: strip tags and return plain text
            let document = Html::parse_document(html);
            document.root_element().text().collect::<String>()
        })
    }

    fn process_html(url: &str, html: &str) -> RenderedPage {
        let title = {
            let document = Html::parse_document(html);
            Self::extract_title(&document)
        };

        let cleaned = Self::remove_boilerplate(html);
        let markdown = Self::html_to_markdown(&cleaned);

        RenderedPage {
            url: url.to_string(),
            markdown,
            title,
        }
    }
}

#[async_trait]
impl BaseRenderer for BrowserRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage> {
        let request = RenderRequest {
            url,
            timeout_ms: timeout.as_millis() as u64,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout + Duration::from_secs(5))
            .json(&request)
            .send()
            .await
            .context("Render request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Render service returned HTTP {} for {}", status, url);
        }

        let rendered: RenderResponse = response
            .json()
            .await
            .context("Failed to parse render response")?;

        if rendered.html.len() < MIN_HTML_CHARS {
            anyhow::bail!(
                "Insufficient page content ({} chars) for {}",
                rendered.html.len(),
                url
            );
        }

        let page = Self::process_html(url, &rendered.html);

        debug!(
            url = %url,
            html_length = rendered.html.len(),
            markdown_length = page.markdown.len(),
            "Page rendered"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_html_strips_boilerplate_and_extracts_title() {
        let html = r#"
            <html>
              <head><title>Jobs at Example</title><script>var x = 1;</script></head>
              <body>
                <nav><a href="/">Home</a></nav>
                <h1>Open Positions</h1>
                <p>Software Engineer - Backend</p>
                <footer>Copyright</footer>
              </body>
            </html>
        "#;

        let page = BrowserRenderer::process_html("https://example.com/careers", html);

        assert_eq!(page.title.as_deref(), Some("Jobs at Example"));
        assert!(page.markdown.contains("Open Positions"));
        assert!(page.markdown.contains("Software Engineer"));
        assert!(!page.markdown.contains("var x"));
        assert!(!page.markdown.contains("Copyright"));
    }
}
