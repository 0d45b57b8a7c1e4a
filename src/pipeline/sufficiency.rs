//! Context sufficiency judgment.

use super::template::render;
use crate::core::errors::PipelineError;
use crate::llm::TextGenerator;

#[derive(Debug, Clone)]
pub struct SufficiencyVerdict {
    pub sufficient: bool,
    /// What the model says is still missing. Meaningful to the caller only
    /// when the verdict is insufficient, but always populated from the
    /// response body.
    pub missing_info: String,
}

/// Ask the model whether `context` suffices to answer `question`.
///
/// The prompt instructs the model to put `Verdict: sufficient` or
/// `Verdict: insufficient` on the first line; the label prefix is
/// optional and matching is a case-insensitive prefix test. Anything else
/// on the first line degrades conservatively to insufficient with a
/// warning; the pipeline is never failed from here.
pub async fn evaluate_sufficiency(
    generator: &dyn TextGenerator,
    question: &str,
    context: &str,
    template: &str,
) -> Result<SufficiencyVerdict, PipelineError> {
    let prompt = render(template, &[("question", question), ("context", context)])?;
    let response = generator.generate(&prompt).await?;
    Ok(parse_verdict(&response))
}

fn parse_verdict(response: &str) -> SufficiencyVerdict {
    let first_line = response.lines().next().unwrap_or("").trim();
    let label = strip_verdict_prefix(first_line);
    let lower = label.to_lowercase();

    let sufficient = lower.starts_with("sufficient");
    if !sufficient && !lower.starts_with("insufficient") {
        tracing::warn!(
            "Unexpected evaluation response format ({:?}); assuming insufficient context",
            first_line
        );
    }

    let missing_info = response
        .lines()
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    SufficiencyVerdict {
        sufficient,
        missing_info,
    }
}

fn strip_verdict_prefix(line: &str) -> &str {
    const PREFIX: &str = "verdict:";
    // `get` rejects a split inside a multibyte character, so non-ASCII
    // first lines fall through to the unchanged-line case.
    match line.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => line[PREFIX.len()..].trim_start(),
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_first_line_is_sufficient() {
        let verdict = parse_verdict("Sufficient");
        assert!(verdict.sufficient);
        assert_eq!(verdict.missing_info, "");
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        assert!(parse_verdict("SUFFICIENT context found.").sufficient);
        assert!(!parse_verdict("insufficient").sufficient);
        assert!(!parse_verdict("Insufficient: needs dates").sufficient);
    }

    #[test]
    fn verdict_label_is_stripped() {
        assert!(parse_verdict("Verdict: Sufficient").sufficient);
        assert!(!parse_verdict("VERDICT: insufficient").sufficient);
    }

    #[test]
    fn remaining_lines_become_missing_info() {
        let verdict = parse_verdict("Insufficient\nNo population figures.\nNo dates.\n");
        assert!(!verdict.sufficient);
        assert_eq!(verdict.missing_info, "No population figures.\nNo dates.");
    }

    #[test]
    fn missing_info_is_kept_even_when_sufficient() {
        let verdict = parse_verdict("Sufficient\nall covered");
        assert!(verdict.sufficient);
        assert_eq!(verdict.missing_info, "all covered");
    }

    #[test]
    fn malformed_first_line_degrades_to_insufficient() {
        let verdict = parse_verdict("Maybe? Hard to say.\nmore text");
        assert!(!verdict.sufficient);
        assert_eq!(verdict.missing_info, "more text");
    }

    #[test]
    fn multibyte_first_line_degrades_to_insufficient() {
        let verdict = parse_verdict("不十分です。情報が足りません");
        assert!(!verdict.sufficient);

        let verdict = parse_verdict("Verdict: 不十分\n日付がない");
        assert!(!verdict.sufficient);
        assert_eq!(verdict.missing_info, "日付がない");
    }

    #[test]
    fn empty_response_degrades_to_insufficient() {
        let verdict = parse_verdict("");
        assert!(!verdict.sufficient);
        assert_eq!(verdict.missing_info, "");
    }
}
