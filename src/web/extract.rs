//! Page fetching and plain-text extraction.
//!
//! URLs that fail to fetch are logged and dropped from the result set;
//! the caller sees only the pages that could be read.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::errors::PipelineError;

const FETCH_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// Fetch each URL and extract its text. Pages are returned in input
    /// order; failed URLs are absent from the result.
    async fn extract(&self, urls: &[String]) -> Vec<(String, String)>;
}

pub struct HttpPageExtractor {
    client: Client,
}

impl HttpPageExtractor {
    pub fn new() -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(PipelineError::internal)?;
        Ok(Self { client })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        if !response.status().is_success() {
            return Err(PipelineError::Upstream(format!(
                "fetch failed: {}",
                response.status()
            )));
        }

        let html = response.text().await.map_err(PipelineError::upstream)?;
        Ok(strip_html_tags(&html))
    }
}

#[async_trait]
impl PageExtractor for HttpPageExtractor {
    async fn extract(&self, urls: &[String]) -> Vec<(String, String)> {
        let mut pages = Vec::new();
        for url in urls {
            match self.fetch_text(url).await {
                Ok(text) if !text.trim().is_empty() => {
                    pages.push((url.clone(), text));
                }
                Ok(_) => {
                    tracing::warn!("No text extracted from {}", url);
                }
                Err(err) => {
                    tracing::warn!("Failed to fetch {}: {}", url, err);
                }
            }
        }
        pages
    }
}

/// Strip markup from an HTML document, dropping script and style bodies,
/// and collapse the result to trimmed non-empty lines.
pub fn strip_html_tags(html: &str) -> String {
    let chars: Vec<char> = html.chars().collect();
    let lower: Vec<char> = html.to_lowercase().chars().collect();

    let mut result = String::new();
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;
    let mut i = 0;

    while i < chars.len() {
        if in_script {
            if starts_with_at(&lower, i, "</script>") {
                in_script = false;
                i += "</script>".len();
            } else {
                i += 1;
            }
            continue;
        }
        if in_style {
            if starts_with_at(&lower, i, "</style>") {
                in_style = false;
                i += "</style>".len();
            } else {
                i += 1;
            }
            continue;
        }

        if starts_with_at(&lower, i, "<script") {
            in_script = true;
            i += 1;
            continue;
        }
        if starts_with_at(&lower, i, "<style") {
            in_style = true;
            i += 1;
            continue;
        }

        let c = chars[i];
        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            if in_tag {
                in_tag = false;
                // Tag boundaries act as whitespace so adjacent text
                // nodes do not run together.
                result.push(' ');
            }
        } else if !in_tag {
            result.push(c);
        }
        i += 1;
    }

    result
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn starts_with_at(haystack: &[char], at: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    haystack.len() >= at + needle.len() && haystack[at..at + needle.len()] == needle[..]
}
