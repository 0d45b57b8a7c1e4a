use async_trait::async_trait;

use crate::core::errors::PipelineError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama", "gemini")
    fn name(&self) -> &str;

    /// single-prompt text generation (non-streaming)
    async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, PipelineError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String], model_id: &str)
        -> Result<Vec<Vec<f32>>, PipelineError>;
}
