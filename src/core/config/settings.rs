//! Typed configuration tree.
//!
//! Every recognized option lives in a named field so that a missing or
//! mistyped key fails at load time instead of deep inside the pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A value that differs between local and cloud generation modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerMode<T> {
    pub local: T,
    pub cloud: T,
}

impl<T> PerMode<T> {
    pub fn active(&self, use_cloud: bool) -> &T {
        if use_cloud {
            &self.cloud
        } else {
            &self.local
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub use_cloud: bool,
    pub model: PerMode<String>,
    pub prompts: PromptSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub search: SearchSettings,
    pub summarization: SummarizationSettings,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSettings>,
    #[serde(default)]
    pub local: LocalSettings,
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// Prompt templates, one per pipeline stage and generation mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Placeholders: {question}
    pub index_query: PerMode<String>,
    /// Placeholders: {question}, {previous_query}, {missing_info}
    pub search_query: PerMode<String>,
    /// Placeholders: {question}, {context}
    pub context_evaluation: PerMode<String>,
    /// Placeholders: {text}
    pub summarization: PerMode<String>,
    /// Placeholders: {question}, {context}
    pub answer: PerMode<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    pub database_path: PathBuf,
    pub collection: String,
    pub embedding_model: PerMode<String>,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub max_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    pub result_count: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationSettings {
    pub text_length_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_calls: u32,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    pub base_url: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub google_search_api_key: Option<String>,
    #[serde(default)]
    pub google_search_engine_id: Option<String>,
}
