use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::errors::PipelineError;

#[async_trait]
pub trait SearchConnector: Send + Sync {
    /// Issue a web search; return up to `result_count` result URLs.
    async fn search(
        &self,
        query: &str,
        result_count: usize,
        timeout: Duration,
    ) -> Result<Vec<String>, PipelineError>;
}

/// Google Custom Search API connector.
pub struct GoogleSearchConnector {
    api_key: String,
    engine_id: String,
    client: Client,
}

impl GoogleSearchConnector {
    pub fn new(api_key: String, engine_id: String) -> Self {
        Self {
            api_key,
            engine_id,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SearchConnector for GoogleSearchConnector {
    async fn search(
        &self,
        query: &str,
        result_count: usize,
        timeout: Duration,
    ) -> Result<Vec<String>, PipelineError> {
        let url = format!(
            "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}&num={}",
            self.api_key,
            self.engine_id,
            urlencoding::encode(query),
            result_count
        );

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        if !response.status().is_success() {
            return Err(PipelineError::Upstream(format!(
                "Google search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(PipelineError::upstream)?;
        let items = payload
            .get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut urls = Vec::new();
        for item in items {
            if let Some(link) = item.get("link").and_then(|v| v.as_str()) {
                if !link.is_empty() {
                    urls.push(link.to_string());
                }
            }
            if urls.len() >= result_count {
                break;
            }
        }

        Ok(urls)
    }
}
