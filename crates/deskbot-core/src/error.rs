//! Error types for the answering pipeline.

use thiserror::Error;

/// Result type alias using DeskbotError.
pub type Result<T> = std::result::Result<T, DeskbotError>;

/// Errors that can occur in the answering pipeline.
///
/// Retrieval-quality shortfalls (no results, low confidence) are NOT errors;
/// they surface as `EscalationDecision` values so the caller can present a
/// human-handoff message instead of a failure.
#[derive(Error, Debug)]
pub enum DeskbotError {
    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Configuration error (bad values, unparseable file).
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Chunking error.
    #[error("Chunking error: {message}")]
    Chunking { message: String },

    /// Vector index error (upsert/query failure from the backing service).
    #[error("Index error: {message}")]
    Index { message: String },

    /// Embedding capability error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Answer-generation capability error.
    #[error("Completion error: {message}")]
    Completion { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeskbotError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a chunking error.
    pub fn chunking(message: impl Into<String>) -> Self {
        Self::Chunking {
            message: message.into(),
        }
    }

    /// Create an index error.
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a completion error.
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable error code for the API layer to map onto transport codes.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Chunking { .. } => "CHUNKING_ERROR",
            Self::Index { .. } => "INDEX_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Completion { .. } => "COMPLETION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeskbotError::index("collection unreachable");
        assert!(err.to_string().contains("collection unreachable"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DeskbotError::invalid_argument("x").error_code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(DeskbotError::embedding("x").error_code(), "EMBEDDING_ERROR");
        assert_eq!(DeskbotError::config("x").error_code(), "CONFIG_ERROR");
    }
}
