//! deskbot-llm - External capability clients
//!
//! The pipeline treats embedding generation and answer generation as
//! black-box capabilities behind the [`EmbeddingClient`] and
//! [`CompletionClient`] traits from `deskbot-core`. This crate provides:
//!
//! - [`HttpEmbedder`] / [`HttpCompleter`]: clients for OpenAI-compatible
//!   HTTP endpoints. Each stage makes a single call; timeout and retry
//!   policy belong to the surrounding caller, not to this core.
//! - [`MockEmbedder`] / [`MockCompleter`]: deterministic stand-ins for
//!   tests and offline demos.

mod http;
mod mock;

pub use http::{HttpCompleter, HttpEmbedder};
pub use mock::{MockCompleter, MockEmbedder};

// Re-export the traits for convenience
pub use deskbot_core::{CompletionClient, EmbeddingClient};
