use super::template::render;
use crate::core::errors::PipelineError;
use crate::llm::TextGenerator;

/// Render a query-generation prompt and ask the model for a query string.
///
/// Parameter-shape agnostic: the same routine serves index lookup queries
/// (`{question}`) and refined web search queries (`{question}`,
/// `{previous_query}`, `{missing_info}`). A placeholder without a matching
/// parameter propagates as a template error; a malformed query is worse
/// than an aborted question.
pub async fn make_query(
    generator: &dyn TextGenerator,
    template: &str,
    params: &[(&str, &str)],
) -> Result<String, PipelineError> {
    let prompt = render(template, params)?;
    let response = generator.generate(&prompt).await?;
    Ok(response.trim().to_string())
}
