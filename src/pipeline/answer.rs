use super::template::render;
use crate::core::errors::PipelineError;
use crate::llm::TextGenerator;

/// Produce the final answer from the question and its best-known context.
pub async fn answer_with_context(
    generator: &dyn TextGenerator,
    question: &str,
    context: &str,
    template: &str,
) -> Result<String, PipelineError> {
    let prompt = render(template, &[("question", question), ("context", context)])?;
    let response = generator.generate(&prompt).await?;
    Ok(response.trim().to_string())
}
