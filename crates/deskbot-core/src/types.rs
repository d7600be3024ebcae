//! Core domain types for the support-desk answering pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Where a piece of knowledge came from; affects how much weight a
/// human reviewer gives it, not how it is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Authoritative knowledge-base article.
    KbArticle,
    /// Product manual or official guide.
    Manual,
    /// Conversational log mined from past support chats.
    ChatTranscript,
    /// Resolved ticket text.
    Ticket,
    /// Curated question/answer pair.
    TrainingExample,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::KbArticle => "kb_article",
            Self::Manual => "manual",
            Self::ChatTranscript => "chat_transcript",
            Self::Ticket => "ticket",
            Self::TrainingExample => "training_example",
        };
        write!(f, "{}", s)
    }
}

/// Priority tier assigned by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// Document-level metadata.
///
/// Required fields are statically typed; source-specific extras go into
/// the extension map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Topical category in display form (e.g. "Password Reset").
    pub category: String,

    /// Source kind.
    pub source: SourceKind,

    /// Priority tier.
    #[serde(default)]
    pub priority: Priority,

    /// Source-specific extras (ticket numbers, article URLs, ...).
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl DocumentMeta {
    /// Create metadata with the given category and source kind.
    pub fn new(category: impl Into<String>, source: SourceKind) -> Self {
        Self {
            category: category.into(),
            source,
            priority: Priority::default(),
            extra: HashMap::new(),
        }
    }
}

/// A document in the knowledge base.
///
/// Created once per ingested source and immutable afterwards; re-ingestion
/// replaces the whole index rather than patching individual chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Caller-assigned identifier.
    pub id: String,

    /// Full document text.
    pub text: String,

    /// Document metadata.
    pub meta: DocumentMeta,

    /// Blake3 hash of the text, for re-ingestion change detection.
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl Document {
    /// Create a new document with a caller-assigned id.
    pub fn new(id: impl Into<String>, text: impl Into<String>, meta: DocumentMeta) -> Self {
        let text = text.into();
        let content_hash = Some(blake3::hash(text.as_bytes()).to_hex().to_string());
        Self {
            id: id.into(),
            text,
            meta,
            content_hash,
        }
    }

    /// Create a new document with a generated id.
    pub fn with_generated_id(text: impl Into<String>, meta: DocumentMeta) -> Self {
        let id = Ulid::new().to_string().to_lowercase();
        Self::new(id, text, meta)
    }

    /// Check whether the text differs from what was hashed at creation.
    pub fn content_changed(&self, new_text: &str) -> bool {
        let new_hash = blake3::hash(new_text.as_bytes()).to_hex().to_string();
        self.content_hash
            .as_ref()
            .map(|h| *h != new_hash)
            .unwrap_or(true)
    }
}

/// Chunk-level metadata: the parent document's fields plus position info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Topical category, copied from the parent document.
    pub category: String,

    /// Source kind, copied from the parent document.
    pub source: SourceKind,

    /// Priority tier, copied from the parent document.
    #[serde(default)]
    pub priority: Priority,

    /// Position of the chunk within its document (0-based).
    pub chunk_number: u32,

    /// Character count of the chunk content.
    pub char_count: usize,

    /// Extension map, copied from the parent document.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChunkMeta {
    /// Derive chunk metadata from a document's metadata.
    pub fn from_document(meta: &DocumentMeta, chunk_number: u32, char_count: usize) -> Self {
        Self {
            category: meta.category.clone(),
            source: meta.source,
            priority: meta.priority,
            chunk_number,
            char_count,
            extra: meta.extra.clone(),
        }
    }

    /// Look up a metadata field by name, as a string.
    ///
    /// Typed fields resolve first; anything else falls through to the
    /// extension map. Used by metadata equality filters.
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "category" => Some(self.category.clone()),
            "source" => Some(self.source.to_string()),
            "priority" => Some(self.priority.to_string()),
            _ => self.extra.get(key).map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// A bounded, independently retrievable slice of a document.
///
/// The unit of storage and retrieval. Ids are derived deterministically
/// from the parent document id and the chunk's sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the form `{doc_id}_chunk_{n}`.
    pub id: String,

    /// Chunk text content.
    pub content: String,

    /// Chunk metadata.
    pub meta: ChunkMeta,
}

impl Chunk {
    /// Create a chunk for the given document and sequence number.
    pub fn new(doc_id: &str, chunk_number: u32, content: impl Into<String>, meta: ChunkMeta) -> Self {
        Self {
            id: format!("{}_chunk_{}", doc_id, chunk_number),
            content: content.into(),
            meta,
        }
    }
}

/// Equality constraint applied during vector-index search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataFilter {
    pairs: Vec<(String, String)>,
}

impl MetadataFilter {
    /// Create an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Filter restricted to a category's display form.
    pub fn category(value: impl Into<String>) -> Self {
        Self::new().with("category", value)
    }

    /// True when every constrained field matches exactly.
    pub fn matches(&self, meta: &ChunkMeta) -> bool {
        self.pairs
            .iter()
            .all(|(k, v)| meta.field(k).as_deref() == Some(v.as_str()))
    }

    /// True when the filter has no constraints.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A per-query candidate returned by the index and re-scored by the
/// retriever. Transient; nothing here persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    /// Id of the matched chunk.
    pub chunk_id: String,

    /// Chunk content.
    pub content: String,

    /// Chunk metadata.
    pub meta: ChunkMeta,

    /// Distance reported by the index (smaller = more similar).
    pub distance: f32,

    /// Hybrid score assigned by the retriever (larger = better).
    #[serde(default)]
    pub combined_score: f32,
}

/// Result of classifying a query against the category taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Category name (e.g. "password_reset"), or "general".
    pub category: String,

    /// Match confidence in [0, 1].
    pub confidence: f32,
}

/// Why a query was (or was not) handed off to a human.
///
/// Expected, frequent retrieval-quality shortfalls are modeled here as
/// values rather than errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// The user explicitly asked for a human.
    ExplicitRequest,
    /// The query touches a topic that always requires a human.
    CriticalTopic,
    /// Retrieval produced no candidates at all.
    NoRelevantInformation,
    /// The best candidate's combined score fell below the floor.
    LowConfidence(f32),
    /// The query bundles too many issues for one automated answer.
    ComplexQuery,
    /// No escalation: retrieval found enough signal to answer.
    SufficientInformation,
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExplicitRequest => write!(f, "explicit request"),
            Self::CriticalTopic => write!(f, "critical topic"),
            Self::NoRelevantInformation => write!(f, "no relevant information"),
            Self::LowConfidence(score) => write!(f, "low confidence score: {:.2}", score),
            Self::ComplexQuery => write!(f, "complex multi-issue query"),
            Self::SufficientInformation => write!(f, "sufficient information available"),
        }
    }
}

/// Outcome of the escalation decision cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationDecision {
    /// Whether to hand off to a human.
    pub escalate: bool,

    /// Which cascade step decided.
    pub reason: EscalationReason,
}

impl EscalationDecision {
    /// An escalating decision with the given reason.
    pub fn escalate(reason: EscalationReason) -> Self {
        Self {
            escalate: true,
            reason,
        }
    }

    /// The non-escalating decision.
    pub fn answer() -> Self {
        Self {
            escalate: false,
            reason: EscalationReason::SufficientInformation,
        }
    }
}

/// The assembled, length-budgeted context passed to answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Formatted context text.
    pub text: String,

    /// Ids of the chunks whose content appears in `text`.
    pub included_chunk_ids: Vec<String>,
}

/// Coarse confidence band reported alongside an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// A source reference included in an answer payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk id.
    pub chunk_id: String,

    /// Chunk category.
    pub category: String,

    /// Relevance (the chunk's combined score).
    pub relevance: f32,
}

/// The structured outcome of answering a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Whether the query was handed off to a human.
    pub escalate: bool,

    /// Reason for the escalation decision.
    pub reason: Option<String>,

    /// Generated answer text, or the handoff message when escalated.
    pub response: Option<String>,

    /// Confidence band.
    pub confidence: ConfidenceBand,

    /// Sources consulted, best first.
    pub sources: Vec<SourceRef>,
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Statistics about the backing vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored chunks.
    pub count: u64,

    /// Name of the backing collection.
    pub index_name: String,
}
