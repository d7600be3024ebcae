//! Candidate retrieval and hybrid re-ranking.
//!
//! Semantic distance alone misranks short, keyword-dense authoritative
//! answers below longer loosely-related text, so retrieved candidates are
//! re-scored with a capped keyword boost before ranking.

use std::sync::Arc;

use tracing::debug;

use deskbot_core::{
    EmbeddingClient, MetadataFilter, Result, RetrievalCandidate, RetrievalConfig, Taxonomy,
    VectorIndex,
};

use crate::keywords::extract_keywords;

/// Never hand downstream stages fewer than this many candidates when the
/// index produced at least this many.
const MIN_KEEP: usize = 3;

/// Fetches candidates from the vector index and re-ranks them by a hybrid
/// similarity+keyword score.
pub struct Retriever<I, E> {
    index: Arc<I>,
    embedder: Arc<E>,
    config: RetrievalConfig,
    taxonomy: Taxonomy,
}

impl<I, E> Retriever<I, E>
where
    I: VectorIndex,
    E: EmbeddingClient,
{
    /// Create a retriever.
    pub fn new(index: Arc<I>, embedder: Arc<E>, config: RetrievalConfig, taxonomy: Taxonomy) -> Self {
        Self {
            index,
            embedder,
            config,
            taxonomy,
        }
    }

    /// Retrieve up to `k` re-ranked candidates for a query.
    ///
    /// `category` (machine name) restricts the index search to that
    /// category's display form; when the filtered search yields fewer
    /// than three candidates the search widens to the whole index.
    pub async fn retrieve(
        &self,
        query_text: &str,
        category: Option<&str>,
        k: Option<usize>,
    ) -> Result<Vec<RetrievalCandidate>> {
        let k = k.unwrap_or(self.config.top_k);
        let fetch_k = k * 2;

        let query_embedding = self.embedder.embed_query(query_text).await?;

        let mut candidates = match category.filter(|c| *c != "general") {
            Some(name) => {
                let filter = MetadataFilter::category(self.taxonomy.display_for(name));
                let filtered = self
                    .index
                    .query(&query_embedding, fetch_k, Some(&filter))
                    .await?;
                if filtered.len() < MIN_KEEP {
                    debug!(
                        category = name,
                        found = filtered.len(),
                        "category filter too narrow, widening search"
                    );
                    self.index.query(&query_embedding, fetch_k, None).await?
                } else {
                    filtered
                }
            }
            None => self.index.query(&query_embedding, fetch_k, None).await?,
        };

        let keywords = extract_keywords(query_text);
        for candidate in &mut candidates {
            candidate.combined_score = self.score(candidate, &keywords);
        }

        candidates.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let kept: Vec<RetrievalCandidate> = candidates
            .iter()
            .take(k)
            .filter(|c| c.combined_score >= self.config.similarity_threshold)
            .cloned()
            .collect();

        // Never starve downstream stages when some signal exists.
        if kept.len() < MIN_KEEP && candidates.len() >= MIN_KEEP {
            debug!(
                kept = kept.len(),
                raw = candidates.len(),
                "below threshold, falling back to top {}",
                MIN_KEEP
            );
            candidates.truncate(MIN_KEEP);
            return Ok(candidates);
        }

        Ok(kept)
    }

    /// Hybrid score: semantic similarity plus a capped keyword boost.
    fn score(&self, candidate: &RetrievalCandidate, keywords: &[String]) -> f32 {
        let content_lower = candidate.content.to_lowercase();
        let matches = keywords
            .iter()
            .filter(|kw| content_lower.contains(kw.as_str()))
            .count();

        let semantic = 1.0 - candidate.distance;
        let boost =
            (self.config.keyword_boost_step * matches as f32).min(self.config.keyword_boost_cap);

        semantic + boost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskbot_core::{Chunk, ChunkMeta, DocumentMeta, IndexStats, SourceKind};

    /// Index stub returning preset candidates, so distances are exact.
    struct StubIndex {
        filtered: Vec<RetrievalCandidate>,
        unfiltered: Vec<RetrievalCandidate>,
    }

    #[async_trait]
    impl VectorIndex for StubIndex {
        async fn upsert(&self, _chunks: &[Chunk], _embeddings: &[Vec<f32>]) -> Result<()> {
            Ok(())
        }

        async fn query(
            &self,
            _embedding: &[f32],
            k: usize,
            filter: Option<&MetadataFilter>,
        ) -> Result<Vec<RetrievalCandidate>> {
            let mut source = if filter.is_some() {
                self.filtered.clone()
            } else {
                self.unfiltered.clone()
            };
            source.truncate(k);
            Ok(source)
        }

        async fn stats(&self) -> Result<IndexStats> {
            Ok(IndexStats {
                count: self.unfiltered.len() as u64,
                index_name: "stub".to_string(),
            })
        }
    }

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingClient for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    fn candidate(id: &str, content: &str, distance: f32) -> RetrievalCandidate {
        let meta = DocumentMeta::new("Password Reset", SourceKind::KbArticle);
        RetrievalCandidate {
            chunk_id: id.to_string(),
            content: content.to_string(),
            meta: ChunkMeta::from_document(&meta, 0, content.chars().count()),
            distance,
            combined_score: 0.0,
        }
    }

    fn retriever(index: StubIndex) -> Retriever<StubIndex, StubEmbedder> {
        Retriever::new(
            Arc::new(index),
            Arc::new(StubEmbedder),
            RetrievalConfig::default(),
            Taxonomy::default(),
        )
    }

    #[tokio::test]
    async fn test_keyword_boost_breaks_distance_ties() {
        let index = StubIndex {
            filtered: Vec::new(),
            unfiltered: vec![
                candidate("plain", "unrelated troubleshooting text", 0.4),
                candidate("boosted", "reset your password in the portal", 0.4),
            ],
        };

        let results = retriever(index)
            .retrieve("how do I reset my password", None, None)
            .await
            .unwrap();

        assert_eq!(results[0].chunk_id, "boosted");
        assert!(results[0].combined_score > results[1].combined_score);
    }

    #[tokio::test]
    async fn test_keyword_boost_is_capped() {
        let index = StubIndex {
            filtered: Vec::new(),
            unfiltered: vec![candidate(
                "dense",
                "password reset portal account email link password reset",
                0.5,
            )],
        };

        let results = retriever(index)
            .retrieve(
                "password reset portal account email link steps",
                None,
                None,
            )
            .await
            .unwrap();

        // Semantic 0.5 plus the boost cap, never more.
        assert!((results[0].combined_score - 0.8).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_threshold_filter_with_top3_fallback() {
        let index = StubIndex {
            filtered: Vec::new(),
            unfiltered: (0..10)
                .map(|i| candidate(&format!("c{}", i), "nothing in common", 0.95))
                .collect(),
        };

        let results = retriever(index)
            .retrieve("completely unrelated question", None, None)
            .await
            .unwrap();

        // All combined scores sit below the threshold, but raw candidates
        // exist, so the top 3 survive.
        assert_eq!(results.len(), 3);
        assert!(results[0].combined_score < 0.3);
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let index = StubIndex {
            filtered: Vec::new(),
            unfiltered: Vec::new(),
        };

        let results = retriever(index)
            .retrieve("anything", None, None)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_narrow_category_filter_widens() {
        let index = StubIndex {
            // Only one candidate matches the category filter.
            filtered: vec![candidate("f0", "password reset steps", 0.2)],
            unfiltered: (0..5)
                .map(|i| candidate(&format!("u{}", i), "password reset steps", 0.2))
                .collect(),
        };

        let results = retriever(index)
            .retrieve("reset my password", Some("password_reset"), None)
            .await
            .unwrap();

        // Widened past the single filtered hit.
        assert!(results.len() >= 3);
        assert!(results.iter().any(|c| c.chunk_id.starts_with('u')));
    }

    #[tokio::test]
    async fn test_general_category_skips_filter() {
        let index = StubIndex {
            filtered: vec![candidate("f0", "should not be used", 0.1)],
            unfiltered: (0..3)
                .map(|i| candidate(&format!("u{}", i), "general answer text", 0.2))
                .collect(),
        };

        let results = retriever(index)
            .retrieve("anything general", Some("general"), None)
            .await
            .unwrap();

        assert!(results.iter().all(|c| c.chunk_id.starts_with('u')));
    }
}
