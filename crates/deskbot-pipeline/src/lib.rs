//! deskbot-pipeline - Answer orchestration
//!
//! Sequences the whole answering pipeline: classification, retrieval,
//! the escalation check, context assembly, and the final delegation to
//! the answer-generation capability. Also owns ingestion: chunking a
//! document, embedding the chunks in batches, and upserting them into
//! the vector index.
//!
//! Each query is an independent, stateless unit of work; the engine holds
//! no mutable state across queries beyond the externally-owned index.

mod engine;

pub use engine::AnswerEngine;
