//! deskbot-core - Core types and traits for the support-desk assistant
//!
//! This crate provides the foundational types, traits, configuration, and
//! error handling used throughout the deskbot pipeline.

pub mod config;
pub mod error;
pub mod taxonomy;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{DeskbotError, Result};
pub use taxonomy::{CategoryDef, Taxonomy};
pub use traits::*;
pub use types::*;
