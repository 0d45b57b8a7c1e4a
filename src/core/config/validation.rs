use super::settings::{PerMode, Settings};
use crate::core::errors::PipelineError;
use crate::pipeline::template::placeholders;

/// Fail-fast validation of loaded settings. A bad range or an unknown
/// prompt placeholder is rejected here rather than mid-pipeline.
pub fn validate_settings(settings: &Settings) -> Result<(), PipelineError> {
    validate_min(settings.retrieval.max_attempts, 1, "retrieval.max_attempts")?;
    validate_min(settings.index.top_k, 1, "index.top_k")?;
    validate_min(settings.search.result_count, 1, "search.result_count")?;
    validate_min(settings.search.timeout_secs as usize, 1, "search.timeout_secs")?;
    validate_min(
        settings.summarization.text_length_limit,
        1,
        "summarization.text_length_limit",
    )?;

    if let Some(rate_limit) = &settings.rate_limit {
        validate_min(rate_limit.max_calls as usize, 1, "rate_limit.max_calls")?;
        validate_min(
            rate_limit.interval_secs as usize,
            1,
            "rate_limit.interval_secs",
        )?;
    }

    if settings.index.collection.trim().is_empty() {
        return Err(config_error("index.collection", "value cannot be empty"));
    }

    validate_template(
        &settings.prompts.index_query,
        "prompts.index_query",
        &["question"],
    )?;
    validate_template(
        &settings.prompts.search_query,
        "prompts.search_query",
        &["question", "previous_query", "missing_info"],
    )?;
    validate_template(
        &settings.prompts.context_evaluation,
        "prompts.context_evaluation",
        &["question", "context"],
    )?;
    validate_template(&settings.prompts.summarization, "prompts.summarization", &["text"])?;
    validate_template(
        &settings.prompts.answer,
        "prompts.answer",
        &["question", "context"],
    )?;

    if settings.use_cloud && is_blank(&settings.api_keys.gemini_api_key) {
        return Err(config_error(
            "api_keys.gemini_api_key",
            "required when use_cloud is true",
        ));
    }

    // Search credentials only matter once the loop is allowed to refine.
    if settings.retrieval.max_attempts > 1 {
        if is_blank(&settings.api_keys.google_search_api_key) {
            return Err(config_error(
                "api_keys.google_search_api_key",
                "required when retrieval.max_attempts > 1",
            ));
        }
        if is_blank(&settings.api_keys.google_search_engine_id) {
            return Err(config_error(
                "api_keys.google_search_engine_id",
                "required when retrieval.max_attempts > 1",
            ));
        }
    }

    Ok(())
}

fn validate_template(
    template: &PerMode<String>,
    path: &str,
    allowed: &[&str],
) -> Result<(), PipelineError> {
    for (mode, text) in [("local", &template.local), ("cloud", &template.cloud)] {
        if text.trim().is_empty() {
            return Err(config_error(&format!("{path}.{mode}"), "value cannot be empty"));
        }
        for name in placeholders(text) {
            if !allowed.contains(&name.as_str()) {
                return Err(config_error(
                    &format!("{path}.{mode}"),
                    &format!(
                        "unknown placeholder '{{{name}}}' (allowed: {})",
                        allowed.join(", ")
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn validate_min(value: usize, min: usize, path: &str) -> Result<(), PipelineError> {
    if value < min {
        return Err(config_error(path, &format!("must be at least {min}")));
    }
    Ok(())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn config_error(path: &str, reason: &str) -> PipelineError {
    PipelineError::Config(format!("invalid config at '{path}': {reason}"))
}
