//! In-memory [`VectorIndex`] implementation.
//!
//! Brute-force cosine similarity over all stored vectors behind a
//! `std::sync::RwLock`: queries take shared read access, upserts take the
//! write lock for the whole batch so a failed batch commits nothing.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use deskbot_core::{
    Chunk, DeskbotError, IndexStats, MetadataFilter, Result, RetrievalCandidate, VectorIndex,
};

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// In-memory index for tests, demos, and single-process deployments.
pub struct MemoryIndex {
    name: String,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryIndex {
    /// Create an empty index with the given collection name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(Vec::new()),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(DeskbotError::invalid_argument(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| DeskbotError::index("index lock poisoned"))?;

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            entries.retain(|e| e.chunk.id != chunk.id);
            entries.push(Entry {
                chunk: chunk.clone(),
                embedding: embedding.clone(),
            });
        }

        debug!(batch = chunks.len(), total = entries.len(), "upserted batch");
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalCandidate>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DeskbotError::index("index lock poisoned"))?;

        let mut candidates: Vec<RetrievalCandidate> = entries
            .iter()
            .filter(|e| match filter {
                Some(f) => f.matches(&e.chunk.meta),
                None => true,
            })
            .map(|e| RetrievalCandidate {
                chunk_id: e.chunk.id.clone(),
                content: e.chunk.content.clone(),
                meta: e.chunk.meta.clone(),
                distance: 1.0 - cosine_similarity(embedding, &e.embedding),
                combined_score: 0.0,
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);

        Ok(candidates)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DeskbotError::index("index lock poisoned"))?;

        Ok(IndexStats {
            count: entries.len() as u64,
            index_name: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::{ChunkMeta, DocumentMeta, SourceKind};

    fn chunk(doc_id: &str, n: u32, content: &str, category: &str) -> Chunk {
        let meta = DocumentMeta::new(category, SourceKind::KbArticle);
        let cm = ChunkMeta::from_document(&meta, n, content.chars().count());
        Chunk::new(doc_id, n, content, cm)
    }

    fn unit(x: f32, y: f32) -> Vec<f32> {
        let norm = (x * x + y * y).sqrt();
        vec![x / norm, y / norm]
    }

    async fn seeded() -> MemoryIndex {
        let index = MemoryIndex::new("test_kb");
        let chunks = vec![
            chunk("a", 0, "reset your password via the portal", "Password Reset"),
            chunk("b", 0, "disk upgrade tiers and pricing", "Disk Storage"),
            chunk("c", 0, "rdp troubleshooting steps", "Rdp Connection"),
        ];
        let embeddings = vec![unit(1.0, 0.0), unit(0.0, 1.0), unit(1.0, 1.0)];
        index.upsert(&chunks, &embeddings).await.unwrap();
        index
    }

    #[tokio::test]
    async fn test_query_orders_by_ascending_distance() {
        let index = seeded().await;
        let results = index.query(&unit(1.0, 0.0), 3, None).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk_id, "a_chunk_0");
        assert!(results[0].distance <= results[1].distance);
        assert!(results[1].distance <= results[2].distance);
        assert!(results[0].distance.abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_query_returns_fewer_than_k() {
        let index = seeded().await;
        let results = index.query(&unit(1.0, 0.0), 10, None).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_metadata_filter_restricts_results() {
        let index = seeded().await;
        let filter = MetadataFilter::category("Disk Storage");
        let results = index.query(&unit(1.0, 0.0), 10, Some(&filter)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk_id, "b_chunk_0");
    }

    #[tokio::test]
    async fn test_upsert_length_mismatch_commits_nothing() {
        let index = MemoryIndex::new("test_kb");
        let chunks = vec![chunk("a", 0, "text", "General")];
        let result = index.upsert(&chunks, &[]).await;

        assert!(result.is_err());
        assert_eq!(index.stats().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_id() {
        let index = seeded().await;
        let updated = vec![chunk("a", 0, "updated portal instructions", "Password Reset")];
        index.upsert(&updated, &[unit(-1.0, 0.5)]).await.unwrap();

        assert_eq!(index.stats().await.unwrap().count, 3);
        let results = index.query(&unit(-1.0, 0.5), 1, None).await.unwrap();
        // "a" moved to the new direction and should now win outright.
        assert_eq!(results[0].chunk_id, "a_chunk_0");
        assert_eq!(results[0].content, "updated portal instructions");
    }

    #[tokio::test]
    async fn test_stats() {
        let index = seeded().await;
        let stats = index.stats().await.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.index_name, "test_kb");
    }
}
