//! Core traits defining the seams between pipeline components.

use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::types::{Chunk, ChatTurn, Document, IndexStats, MetadataFilter, RetrievalCandidate};

/// Client contract for the external vector index.
///
/// The index itself (approximate-nearest-neighbor search, persistence) is
/// an external collaborator; this trait is the full surface the pipeline
/// relies on. `query` must be safe for concurrent read access; `upsert`
/// runs exclusively during bulk ingestion, enforced by the deployment
/// process rather than by locks in this core.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a batch of chunks with their embeddings.
    ///
    /// A failed batch must not partially commit.
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Nearest-neighbor search, ordered by ascending distance.
    ///
    /// Returns fewer than `k` entries when the index has fewer eligible
    /// ones. `filter` restricts the search to chunks whose metadata
    /// exactly matches every given key/value pair.
    async fn query(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalCandidate>>;

    /// Index statistics.
    async fn stats(&self) -> Result<IndexStats>;
}

/// Client contract for the external embedding capability.
///
/// The pipeline never computes embeddings itself. A failure here
/// propagates as a pipeline failure; there is no local fallback.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of texts, one vector per text, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::DeskbotError::embedding("empty embedding response"))
    }

    /// Embedding dimensionality.
    fn dimension(&self) -> usize;
}

/// Client contract for the external answer-generation capability.
///
/// Invoked only after the escalation evaluator decides not to hand off.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate an answer given system instructions, prior conversation
    /// turns, and the user turn (with the assembled context folded in).
    async fn complete(
        &self,
        system: &str,
        history: &[ChatTurn],
        user_turn: &str,
        config: &GenerationConfig,
    ) -> Result<String>;
}

/// Chunking strategy: split a document into retrievable units.
pub trait Chunker: Send + Sync {
    /// Chunk a document's text into an ordered sequence of chunks.
    ///
    /// Given identical input and configuration the output is
    /// byte-identical. Empty input yields zero chunks.
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>>;
}
