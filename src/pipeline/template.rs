//! `{placeholder}` prompt template rendering.

use crate::core::errors::PipelineError;

/// Placeholder names referenced by a template, in order of first
/// appearance. A `{` without a matching `}` or a brace pair whose inner
/// text is not a bare identifier is treated as literal text.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    for (name, _, _) in scan(template) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Substitute named parameters into the template. A placeholder with no
/// matching parameter is a fatal template error.
pub fn render(template: &str, params: &[(&str, &str)]) -> Result<String, PipelineError> {
    let mut result = String::with_capacity(template.len());
    let mut cursor = 0;

    for (name, start, end) in scan(template) {
        result.push_str(&template[cursor..start]);
        let value = params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                PipelineError::Template(format!("no parameter for placeholder '{{{name}}}'"))
            })?;
        result.push_str(value);
        cursor = end;
    }

    result.push_str(&template[cursor..]);
    Ok(result)
}

/// Yield `(name, byte_start, byte_end)` for each well-formed placeholder.
fn scan(template: &str) -> Vec<(String, usize, usize)> {
    let mut found = Vec::new();
    let mut rest = 0;

    while let Some(open) = template[rest..].find('{') {
        let open = rest + open;
        let Some(close) = template[open + 1..].find(['{', '}']) else {
            break;
        };
        let close = open + 1 + close;

        if template.as_bytes()[close] == b'{' {
            rest = close;
            continue;
        }

        let name = &template[open + 1..close];
        if !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            found.push((name.to_string(), open, close + 1));
        }
        rest = close + 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_named_parameters() {
        let result = render(
            "Q: {question} (was: {previous_query})",
            &[("question", "why?"), ("previous_query", "what?")],
        )
        .unwrap();
        assert_eq!(result, "Q: why? (was: what?)");
    }

    #[test]
    fn repeated_placeholder_renders_each_occurrence() {
        let result = render("{x} and {x}", &[("x", "a")]).unwrap();
        assert_eq!(result, "a and a");
    }

    #[test]
    fn missing_parameter_is_a_template_error() {
        let err = render("Hello {name}", &[("question", "q")]).unwrap_err();
        assert!(matches!(err, PipelineError::Template(_)));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn extra_parameters_are_ignored() {
        let result = render("{a}", &[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(result, "1");
    }

    #[test]
    fn literal_braces_pass_through() {
        let result = render("json: { \"k\": 1 }", &[]).unwrap();
        assert_eq!(result, "json: { \"k\": 1 }");
    }

    #[test]
    fn extracts_placeholder_names_in_order() {
        let names = placeholders("{question} {context} {question}");
        assert_eq!(names, vec!["question".to_string(), "context".to_string()]);
    }
}
