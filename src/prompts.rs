//! Prompt templates for thumbnail generation.

pub const THUMBNAIL_USER: &str = include_str!("../data/prompts/thumbnail_user.txt");

/// Number of suggestions requested from the model per generation.
pub const BATCH_SIZE: usize = 5;

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is single-pass: placeholder-like text inside a value is left
/// as is, and unknown placeholders are kept verbatim.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        let key = &after_open[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Build the instruction sent to the generation service.
///
/// Callers validate that both inputs are non-blank; the values are embedded
/// verbatim.
pub fn build_prompt(title: &str, keywords: &str) -> String {
    let count = BATCH_SIZE.to_string();
    render(
        THUMBNAIL_USER,
        &[("title", title), ("keywords", keywords), ("count", &count)],
    )
}
