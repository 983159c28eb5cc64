//! Tag normalization.
//!
//! The API only accepts tags made of `[a-z0-9\-_]`; anything else a caller
//! hands us is normalized into that alphabet before it goes on the wire.

use std::collections::HashSet;

/// Normalize a collection of free-text tags into the canonical form the API
/// accepts.
///
/// Each entry is trimmed, lowercased, and stripped of every character
/// outside `[a-z0-9\-_]`; entries that end up empty are dropped, and
/// duplicates keep their first occurrence (stable order). An input that
/// yields nothing returns `None` rather than an empty vector, so callers
/// can distinguish "no tags field" from "tags field present but empty".
pub fn normalize_tags<I, S>(tags: Option<I>) -> Option<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags = tags?;

    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for raw in tags {
        let cleaned: String = raw
            .as_ref()
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_'))
            .collect();
        if cleaned.is_empty() || !seen.insert(cleaned.clone()) {
            continue;
        }
        normalized.push(cleaned);
    }

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Whether a tag is already in canonical form (`^[a-z0-9\-_]+$`).
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_'))
}
