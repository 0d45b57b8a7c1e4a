//! Per-page summarization into a fresh context blob.

use super::template::render;
use crate::core::errors::PipelineError;
use crate::llm::TextGenerator;

/// Summarize each page and build the combined context.
///
/// Returns the context (summaries joined in page order, blank-line
/// separated, trailing whitespace trimmed) and the per-source summary set.
/// Page text is hard-cut at `text_length_limit` characters before
/// summarization; the cut is not word or sentence aware.
pub async fn summarize_pages(
    generator: &dyn TextGenerator,
    pages: &[(String, String)],
    template: &str,
    text_length_limit: usize,
) -> Result<(String, Vec<(String, String)>), PipelineError> {
    let mut summaries = Vec::with_capacity(pages.len());
    let mut context = String::new();

    for (url, text) in pages {
        let short_text: String = text.chars().take(text_length_limit).collect();
        let prompt = render(template, &[("text", &short_text)])?;
        let summary = generator.generate(&prompt).await?.trim().to_string();

        context.push_str(&summary);
        context.push_str("\n\n");
        summaries.push((url.clone(), summary));
    }

    Ok((context.trim_end().to_string(), summaries))
}
