use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use crate::core::errors::PipelineError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Cloud provider speaking the Gemini REST API.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, PipelineError> {
        let url = format!("{API_BASE}/models/{model_id}:generateContent");
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upstream(format!(
                "gemini generate failed: {status} {text}"
            )));
        }

        let payload: Value = response.json().await.map_err(PipelineError::upstream)?;
        let content = payload
            .get("candidates")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|part| part.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn embed(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, PipelineError> {
        let url = format!("{API_BASE}/models/{model_id}:batchEmbedContents");
        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{model_id}"),
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();
        let body = json!({ "requests": requests });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::upstream)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upstream(format!(
                "gemini embed failed: {status} {text}"
            )));
        }

        let payload: Value = response.json().await.map_err(PipelineError::upstream)?;
        let mut embeddings = Vec::new();
        if let Some(rows) = payload.get("embeddings").and_then(|v| v.as_array()) {
            for row in rows {
                let vector: Vec<f32> = row
                    .get("values")
                    .and_then(|v| v.as_array())
                    .map(|vals| {
                        vals.iter()
                            .filter_map(|v| v.as_f64().map(|f| f as f32))
                            .collect()
                    })
                    .unwrap_or_default();
                embeddings.push(vector);
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(PipelineError::Upstream(format!(
                "gemini embed returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}
