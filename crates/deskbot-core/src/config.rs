//! Configuration types for the answering pipeline.
//!
//! All tuned constants (thresholds, keyword lists, budgets) live here as
//! configuration rather than hard-coded behavior; the shipped defaults are
//! empirically tuned and mean only "low means escalate, high means answer".

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::taxonomy::Taxonomy;

/// Main configuration for the answering pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskbotConfig {
    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding capability configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Answer-generation capability configuration.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Vector index configuration.
    #[serde(default)]
    pub index: IndexConfig,

    /// Retrieval and re-ranking configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Context assembly configuration.
    #[serde(default)]
    pub context: ContextConfig,

    /// Escalation configuration.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Category taxonomy.
    #[serde(default)]
    pub taxonomy: Taxonomy,
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Character overlap between consecutive hard-split windows.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Validate the configuration, failing fast on unusable values.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_chunk_size == 0 {
            return Err(crate::error::DeskbotError::config(
                "chunking.max_chunk_size must be greater than zero",
            ));
        }
        if self.overlap >= self.max_chunk_size {
            return Err(crate::error::DeskbotError::config(format!(
                "chunking.overlap ({}) must be smaller than max_chunk_size ({})",
                self.overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

/// Embedding capability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model identifier sent to the embedding endpoint.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimensionality.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for ingestion-time embedding and upserts.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Base URL of the embedding service.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_batch_size(),
            base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Answer-generation capability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier sent to the completion endpoint.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Base URL of the completion service.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Name of the backing collection.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
        }
    }
}

/// Retrieval and re-ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of candidates to keep.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum combined score a candidate must reach.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Score boost per matched query keyword.
    #[serde(default = "default_keyword_boost_step")]
    pub keyword_boost_step: f32,

    /// Cap on the total keyword boost, so it influences but never
    /// dominates ranking.
    #[serde(default = "default_keyword_boost_cap")]
    pub keyword_boost_cap: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            keyword_boost_step: default_keyword_boost_step(),
            keyword_boost_cap: default_keyword_boost_cap(),
        }
    }
}

/// Context assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Character budget for the assembled context.
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_length: default_max_context_length(),
        }
    }
}

/// Escalation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Combined-score floor below which the top candidate triggers
    /// escalation.
    #[serde(default = "default_low_confidence_floor")]
    pub low_confidence_floor: f32,

    /// Query keyword count above which a query counts as multi-issue.
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: usize,

    /// Phrases that signal an explicit human-handoff request.
    #[serde(default = "default_handoff_phrases")]
    pub handoff_phrases: Vec<String>,

    /// Topics that always escalate, regardless of retrieval quality.
    #[serde(default = "default_critical_keywords")]
    pub critical_keywords: Vec<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            low_confidence_floor: default_low_confidence_floor(),
            complexity_threshold: default_complexity_threshold(),
            handoff_phrases: default_handoff_phrases(),
            critical_keywords: default_critical_keywords(),
        }
    }
}

// Default value functions

fn default_max_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_batch_size() -> usize {
    100
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_tokens() -> u32 {
    900
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_collection() -> String {
    "support_kb".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_similarity_threshold() -> f32 {
    0.3
}

fn default_keyword_boost_step() -> f32 {
    0.1
}

fn default_keyword_boost_cap() -> f32 {
    0.3
}

fn default_max_context_length() -> usize {
    3000
}

fn default_low_confidence_floor() -> f32 {
    0.2
}

fn default_complexity_threshold() -> usize {
    8
}

fn default_handoff_phrases() -> Vec<String> {
    [
        "speak to a human",
        "speak to human",
        "talk to agent",
        "real person",
        "not helpful",
        "doesn't work",
        "still not working",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_critical_keywords() -> Vec<String> {
    ["billing", "refund", "cancel subscription", "cancellation", "legal", "complaint"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl DeskbotConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::DeskbotError::config(format!("Failed to parse config: {}", e))
        })?;
        config.chunking.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths, falling back to defaults.
    pub fn load_default() -> crate::error::Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("deskbot").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("deskbot.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}
