//! deskbot-query - Query-time pipeline stages
//!
//! Everything that happens between receiving a query and handing a
//! bounded context to answer generation:
//!
//! - [`QueryClassifier`]: keyword-bag routing of queries to categories.
//! - [`keywords`]: significant-keyword extraction shared by re-ranking
//!   and the complexity check.
//! - [`Retriever`]: candidate fetch plus hybrid semantic+keyword
//!   re-ranking over a [`VectorIndex`](deskbot_core::VectorIndex).
//! - [`ContextAssembler`]: deduplicated, length-budgeted context.
//! - [`EscalationEvaluator`]: the ordered human-handoff decision cascade.

mod classify;
mod context;
mod escalate;
pub mod keywords;
mod retrieve;

pub use classify::QueryClassifier;
pub use context::ContextAssembler;
pub use escalate::EscalationEvaluator;
pub use retrieve::Retriever;
