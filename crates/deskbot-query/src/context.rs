//! Context assembly: dedup, format, and budget retrieved candidates.

use std::collections::HashSet;

use tracing::debug;

use deskbot_core::{AssembledContext, ContextConfig, RetrievalCandidate, Taxonomy};

/// Character prefix used as a near-duplicate fingerprint.
const FINGERPRINT_CHARS: usize = 100;

/// Blocks that are always kept, truncated rather than dropped.
const GUARANTEED_BLOCKS: usize = 3;

/// Headroom reserved for the block label and ellipsis when truncating.
const TRUNCATION_RESERVE: usize = 100;

/// Smallest useful truncated content; a guaranteed block keeps at least
/// this much even when it pushes past the budget.
const MIN_TRUNCATED_CONTENT: usize = 200;

/// Text returned when retrieval produced nothing at all.
const EMPTY_CONTEXT: &str = "No relevant information found in knowledge base.";

/// Builds the single bounded context string handed to answer generation.
///
/// Total assembled length never exceeds the budget by more than one
/// truncated block's overflow margin (`MIN_TRUNCATED_CONTENT` plus label
/// headroom).
pub struct ContextAssembler {
    config: ContextConfig,
    taxonomy: Taxonomy,
}

impl ContextAssembler {
    /// Create an assembler.
    pub fn new(config: ContextConfig, taxonomy: Taxonomy) -> Self {
        Self { config, taxonomy }
    }

    /// Assemble candidates (in ranking order) into a bounded context.
    pub fn assemble(
        &self,
        candidates: &[RetrievalCandidate],
        category: Option<&str>,
    ) -> AssembledContext {
        if candidates.is_empty() {
            return AssembledContext {
                text: EMPTY_CONTEXT.to_string(),
                included_chunk_ids: Vec::new(),
            };
        }

        let max = self.config.max_context_length;
        let mut parts: Vec<String> = Vec::new();
        let mut included = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut total = 0usize;

        if let Some(name) = category.filter(|c| *c != "general") {
            let banner = format!("[Category: {}]\n", self.taxonomy.display_for(name));
            total += banner.chars().count();
            parts.push(banner);
        }

        let mut emitted = 0usize;
        let mut floored = false;
        for candidate in candidates {
            let fingerprint: String = candidate.content.chars().take(FINGERPRINT_CHARS).collect();
            if !seen.insert(fingerprint) {
                debug!(chunk_id = %candidate.chunk_id, "skipping near-duplicate");
                continue;
            }

            let label = emitted + 1;
            let part = format!(
                "[Source {} - {} | Relevance: {:.2}]\n{}\n\n",
                label, candidate.meta.category, candidate.combined_score, candidate.content
            );
            let part_chars = part.chars().count();

            if total + part_chars > max {
                if emitted >= GUARANTEED_BLOCKS {
                    break;
                }
                // A block in the guaranteed top keeps a truncated version
                // instead of being dropped. At most one block may be padded
                // up to the minimum; that bounds the budget overflow to a
                // single truncated block's margin.
                let mut available = max.saturating_sub(total + TRUNCATION_RESERVE);
                if available < MIN_TRUNCATED_CONTENT {
                    if floored {
                        break;
                    }
                    floored = true;
                    available = MIN_TRUNCATED_CONTENT;
                }
                let truncated: String = candidate.content.chars().take(available).collect();
                let part = format!(
                    "[Source {} - {}]\n{}...\n\n",
                    label, candidate.meta.category, truncated
                );
                total += part.chars().count();
                parts.push(part);
                included.push(candidate.chunk_id.clone());
                emitted += 1;
                continue;
            }

            total += part_chars;
            parts.push(part);
            included.push(candidate.chunk_id.clone());
            emitted += 1;
        }

        AssembledContext {
            text: parts.concat(),
            included_chunk_ids: included,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::{ChunkMeta, DocumentMeta, SourceKind};

    fn candidate(id: &str, content: &str, score: f32) -> RetrievalCandidate {
        let meta = DocumentMeta::new("Disk Storage", SourceKind::KbArticle);
        RetrievalCandidate {
            chunk_id: id.to_string(),
            content: content.to_string(),
            meta: ChunkMeta::from_document(&meta, 0, content.chars().count()),
            distance: 0.2,
            combined_score: score,
        }
    }

    fn assembler(max: usize) -> ContextAssembler {
        ContextAssembler::new(
            ContextConfig {
                max_context_length: max,
            },
            Taxonomy::default(),
        )
    }

    #[test]
    fn test_empty_candidates() {
        let ctx = assembler(3000).assemble(&[], Some("disk_storage"));
        assert_eq!(ctx.text, EMPTY_CONTEXT);
        assert!(ctx.included_chunk_ids.is_empty());
    }

    #[test]
    fn test_blocks_and_banner() {
        let candidates = vec![
            candidate("a", "Upgrade tiers start at 40GB.", 0.91),
            candidate("b", "Check free space under drive properties.", 0.85),
        ];
        let ctx = assembler(3000).assemble(&candidates, Some("disk_storage"));

        assert!(ctx.text.starts_with("[Category: Disk Storage]\n"));
        assert!(ctx.text.contains("[Source 1 - Disk Storage | Relevance: 0.91]"));
        assert!(ctx.text.contains("[Source 2 - Disk Storage | Relevance: 0.85]"));
        assert_eq!(ctx.included_chunk_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_near_duplicates_are_skipped() {
        let shared = "x".repeat(100);
        let candidates = vec![
            candidate("a", &format!("{} tail one", shared), 0.9),
            candidate("b", &format!("{} tail two", shared), 0.8),
            candidate("c", "entirely different content", 0.7),
        ];
        let ctx = assembler(3000).assemble(&candidates, None);

        assert_eq!(ctx.included_chunk_ids, vec!["a", "c"]);
        assert!(!ctx.text.contains("tail two"));
        // Source labels stay contiguous across the skip.
        assert!(ctx.text.contains("[Source 2 - Disk Storage"));
        assert!(!ctx.text.contains("[Source 3"));
    }

    #[test]
    fn test_budget_stops_whole_blocks_after_guaranteed_three() {
        let big = "y".repeat(400);
        let candidates: Vec<_> = (0..8)
            .map(|i| candidate(&format!("c{}", i), &format!("{} {}", i, big), 0.9))
            .collect();
        let ctx = assembler(1500).assemble(&candidates, None);

        // Three full blocks exceed 1200 chars; the fourth would blow the
        // budget and is dropped along with everything after it.
        assert_eq!(ctx.included_chunk_ids.len(), 3);
        let overflow_margin = MIN_TRUNCATED_CONTENT + TRUNCATION_RESERVE;
        assert!(ctx.text.chars().count() <= 1500 + overflow_margin);
    }

    #[test]
    fn test_guaranteed_block_is_truncated_not_dropped() {
        let huge = "z".repeat(5000);
        let candidates = vec![candidate("only", &huge, 0.9)];
        let ctx = assembler(1000).assemble(&candidates, None);

        assert_eq!(ctx.included_chunk_ids, vec!["only"]);
        assert!(ctx.text.contains("..."));
        let overflow_margin = MIN_TRUNCATED_CONTENT + TRUNCATION_RESERVE;
        assert!(ctx.text.chars().count() <= 1000 + overflow_margin);
    }

    #[test]
    fn test_budget_invariant_holds_for_many_shapes() {
        let overflow_margin = MIN_TRUNCATED_CONTENT + TRUNCATION_RESERVE;
        for max in [500, 1000, 3000] {
            for block in [50usize, 300, 2000] {
                let candidates: Vec<_> = (0..6)
                    .map(|i| {
                        candidate(&format!("c{}", i), &format!("{} {}", i, "w".repeat(block)), 0.8)
                    })
                    .collect();
                let ctx = assembler(max).assemble(&candidates, Some("disk_storage"));
                assert!(
                    ctx.text.chars().count() <= max + overflow_margin,
                    "budget {} block {} produced {}",
                    max,
                    block,
                    ctx.text.chars().count()
                );
            }
        }
    }

    #[test]
    fn test_included_ids_match_emitted_blocks() {
        let candidates = vec![
            candidate("a", "first block", 0.9),
            candidate("b", "second block", 0.8),
        ];
        let ctx = assembler(3000).assemble(&candidates, None);
        for id in &ctx.included_chunk_ids {
            let content = &candidates.iter().find(|c| &c.chunk_id == id).unwrap().content;
            assert!(ctx.text.contains(content.as_str()));
        }
    }
}
