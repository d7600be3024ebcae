//! deskbot-chunk - Section-aware chunking
//!
//! Splits knowledge-base documents into bounded, overlapping retrievable
//! units. Splitting is a cascade of structural passes (headers, numbered
//! lists, titled sections, paragraphs) followed by greedy packing; only
//! sections that still exceed the chunk bound get hard-split into
//! overlapping windows.
//!
//! # Example
//!
//! ```rust
//! use deskbot_chunk::SectionChunker;
//! use deskbot_core::{Chunker, ChunkingConfig, Document, DocumentMeta, SourceKind};
//!
//! let chunker = SectionChunker::new(ChunkingConfig::default()).unwrap();
//! let meta = DocumentMeta::new("General", SourceKind::KbArticle);
//! let doc = Document::new("guide", "Short article body.", meta);
//! let chunks = chunker.chunk(&doc).unwrap();
//! assert_eq!(chunks.len(), 1);
//! ```

mod section;

pub use section::SectionChunker;

// Re-export types for convenience
pub use deskbot_core::{Chunker, ChunkingConfig};
