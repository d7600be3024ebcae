//! Significant-keyword extraction.
//!
//! Shared by the re-ranker (keyword boost) and the escalation evaluator
//! (query complexity). Tokens are lower-cased, split on word boundaries,
//! and dropped when they are stop words or shorter than three characters.

/// Common words that carry no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "been", "be", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "my", "i", "me", "how", "what",
    "when",
];

/// Extract the significant keywords from a query, in order of appearance.
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2 && !STOP_WORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}
