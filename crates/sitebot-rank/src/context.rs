use sitebot_core::types::Candidate;

/// Appended when the context is cut to its budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Join candidate texts with a single space, in order, and trim the
/// result. With a budget, a longer result is cut hard at `max_chars`
/// characters (never inside a UTF-8 sequence, not word-aware), trailing
/// whitespace dropped, and `TRUNCATION_MARKER` appended.
pub fn build_context(selected: &[Candidate<'_>], max_chars: Option<usize>) -> String {
    let joined = selected.iter().map(|c| c.chunk.text.as_str()).collect::<Vec<_>>().join(" ");
    let joined = joined.trim();
    match max_chars {
        Some(limit) => truncate_chars(joined, limit),
        None => joined.to_string(),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", text[..cut].trim_end(), TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Source URLs in first-occurrence order, duplicates collapsed.
pub fn unique_sources(selected: &[Candidate<'_>]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for c in selected {
        if !sources.iter().any(|s| s == &c.chunk.url) { sources.push(c.chunk.url.clone()); }
    }
    sources
}
