//! Deterministic mock capabilities for tests and offline demos.

use async_trait::async_trait;

use deskbot_core::{
    ChatTurn, CompletionClient, EmbeddingClient, GenerationConfig, Result,
};

/// Deterministic bag-of-tokens embedder.
///
/// Each token hashes into a dimension bucket; the resulting count vector
/// is L2-normalized. Texts sharing vocabulary land near each other, which
/// is enough signal for retrieval tests without a real model.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a mock embedder with the default dimensionality.
    pub fn new() -> Self {
        Self { dimension: 256 }
    }

    /// Create a mock embedder with a custom dimensionality.
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    fn token_bucket(&self, token: &str) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(131).wrapping_add(b as u64));
        (hash % self.dimension as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[self.token_bucket(token)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Mock completion client that templates the user turn back.
pub struct MockCompleter;

impl MockCompleter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockCompleter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompleter {
    async fn complete(
        &self,
        _system: &str,
        history: &[ChatTurn],
        user_turn: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        Ok(format!(
            "[mock {} | history {} turns] {}",
            config.model,
            history.len(),
            user_turn.chars().take(200).collect::<String>()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new();
        let texts = vec!["reset my password".to_string()];

        let a = embedder.embed(&texts).await.unwrap();
        let b = embedder.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 256);
    }

    #[tokio::test]
    async fn test_mock_embedder_normalizes() {
        let embedder = MockEmbedder::new();
        let vectors = embedder
            .embed(&["quickbooks error codes".to_string()])
            .await
            .unwrap();
        let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let embedder = MockEmbedder::new();
        let vectors = embedder
            .embed(&[
                "how do i reset my password".to_string(),
                "password reset instructions for the portal".to_string(),
                "disk upgrade pricing tiers".to_string(),
            ])
            .await
            .unwrap();

        let related = cosine(&vectors[0], &vectors[1]);
        let unrelated = cosine(&vectors[0], &vectors[2]);
        assert!(
            related > unrelated,
            "related {} should beat unrelated {}",
            related,
            unrelated
        );
    }

    #[tokio::test]
    async fn test_mock_completer_reflects_user_turn() {
        let completer = MockCompleter::new();
        let out = completer
            .complete("sys", &[], "What are the disk tiers?", &GenerationConfig::default())
            .await
            .unwrap();
        assert!(out.contains("What are the disk tiers?"));
    }
}
