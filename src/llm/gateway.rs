//! Model invocation gateway.
//!
//! Owns provider selection (local Ollama vs. cloud Gemini), the optional
//! call rate limiter, and response trimming. The pipeline only ever sees
//! the [`TextGenerator`] and [`Embedder`] seams.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::gemini::GeminiProvider;
use super::ollama::OllamaProvider;
use super::provider::LlmProvider;
use crate::core::config::settings::RateLimitSettings;
use crate::core::config::Settings;
use crate::core::errors::PipelineError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

pub struct ModelGateway {
    provider: Arc<dyn LlmProvider>,
    text_model: String,
    embedding_model: String,
    limiter: Option<DirectLimiter>,
}

impl ModelGateway {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        text_model: String,
        embedding_model: String,
        rate_limit: Option<&RateLimitSettings>,
    ) -> Result<Self, PipelineError> {
        let limiter = rate_limit.map(build_limiter).transpose()?;
        Ok(Self {
            provider,
            text_model,
            embedding_model,
            limiter,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        let provider: Arc<dyn LlmProvider> = if settings.use_cloud {
            let api_key = settings
                .api_keys
                .gemini_api_key
                .clone()
                .ok_or_else(|| {
                    PipelineError::Config("gemini_api_key required for cloud mode".to_string())
                })?;
            Arc::new(GeminiProvider::new(api_key))
        } else {
            Arc::new(OllamaProvider::new(settings.local.base_url.clone()))
        };

        tracing::info!(
            "Using {} provider with model {}",
            provider.name(),
            settings.model.active(settings.use_cloud)
        );

        Self::new(
            provider,
            settings.model.active(settings.use_cloud).clone(),
            settings
                .index
                .embedding_model
                .active(settings.use_cloud)
                .clone(),
            settings.rate_limit.as_ref(),
        )
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl TextGenerator for ModelGateway {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        self.throttle().await;
        let response = self.provider.generate(prompt, &self.text_model).await?;
        Ok(response.trim().to_string())
    }
}

#[async_trait]
impl Embedder for ModelGateway {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.throttle().await;
        self.provider.embed(inputs, &self.embedding_model).await
    }
}

fn build_limiter(config: &RateLimitSettings) -> Result<DirectLimiter, PipelineError> {
    if config.max_calls == 0 || config.interval_secs == 0 {
        return Err(PipelineError::Config(
            "rate_limit fields must be nonzero".to_string(),
        ));
    }

    let period = Duration::from_secs_f64(config.interval_secs as f64 / config.max_calls as f64);
    let quota = Quota::with_period(period)
        .ok_or_else(|| PipelineError::Config("rate_limit period must be nonzero".to_string()))?;
    Ok(RateLimiter::direct(quota))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    struct EchoProvider {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, PipelineError> {
            self.calls.lock().unwrap().push(model_id.to_string());
            Ok(format!("  {prompt} reply  \n"))
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn echo_gateway(rate_limit: Option<RateLimitSettings>) -> ModelGateway {
        ModelGateway::new(
            Arc::new(EchoProvider {
                calls: Mutex::new(Vec::new()),
            }),
            "text-model".to_string(),
            "embed-model".to_string(),
            rate_limit.as_ref(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn generate_trims_provider_output() {
        let gateway = echo_gateway(None);
        let response = gateway.generate("hello").await.unwrap();
        assert_eq!(response, "hello reply");
    }

    #[tokio::test]
    async fn embed_skips_provider_for_empty_input() {
        let gateway = echo_gateway(None);
        let vectors = gateway.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn rate_limiter_spaces_out_calls() {
        let gateway = echo_gateway(Some(RateLimitSettings {
            max_calls: 1,
            interval_secs: 1,
        }));

        let start = Instant::now();
        gateway.generate("first").await.unwrap();
        gateway.generate("second").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(900));
    }
}
