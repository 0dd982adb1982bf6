//! Technique identifier extraction from unstructured text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// `T` + four digits, optional `.` + three digits, as a whole word.
static TECHNIQUE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bT[0-9]{4}(?:\.[0-9]{3})?\b").expect("technique id pattern is valid")
});

/// Every technique-style identifier in `text`, in order of appearance.
///
/// Repeats are kept. Text without a qualifying token yields an empty list.
pub fn extract_ids(text: &str) -> Vec<String> {
    TECHNIQUE_ID_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Like [`extract_ids`] but keeps only the first appearance of each id.
pub fn extract_unique_ids(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    extract_ids(text)
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
