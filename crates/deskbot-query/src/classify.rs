//! Keyword-bag query classification.

use deskbot_core::{Classification, Taxonomy};

/// Maps free-text queries to a topical category with a confidence score.
///
/// Pure: identical input always yields identical output. Ties go to the
/// category defined first in the taxonomy.
pub struct QueryClassifier {
    taxonomy: Taxonomy,
}

impl QueryClassifier {
    /// Create a classifier over the given taxonomy.
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Classify a query; `("general", 0.0)` when nothing matches.
    pub fn classify(&self, query_text: &str) -> Classification {
        let query_lower = query_text.to_lowercase();

        let mut best: Option<(&str, usize, usize)> = None;
        for category in &self.taxonomy.categories {
            let matches = category
                .keywords
                .iter()
                .filter(|keyword| query_lower.contains(keyword.as_str()))
                .count();
            if matches == 0 {
                continue;
            }
            let beats = match best {
                Some((_, best_matches, _)) => matches > best_matches,
                None => true,
            };
            if beats {
                best = Some((category.name.as_str(), matches, category.keywords.len()));
            }
        }

        match best {
            Some((name, matches, total)) => Classification {
                category: name.to_string(),
                confidence: (matches as f32 / total as f32).clamp(0.0, 1.0),
            },
            None => Classification {
                category: "general".to_string(),
                confidence: 0.0,
            },
        }
    }
}
