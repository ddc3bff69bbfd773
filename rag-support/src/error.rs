//! Error types for the `rag-support` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// The vector store is unreachable, refused the credentials, or was used
    /// before a connection was established.
    #[error("Connection error ({backend}): {message}")]
    ConnectionError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A record or query does not fit the collection schema.
    #[error("Schema error ({collection}): {message}")]
    SchemaError {
        /// The collection whose schema was violated.
        collection: String,
        /// A description of the mismatch.
        message: String,
    },

    /// A pending document could not be read.
    #[error("Document read error ({document}): {message}")]
    DocumentReadError {
        /// The identifier of the document.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while generating an answer.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Any other failure reported by the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The staging location could not be listed.
    #[error("Document source error: {0}")]
    SourceError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// An I/O error outside of per-document reads.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Whether the vector store could not be reached.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError { .. })
    }

    /// Whether a record or query violated the collection schema.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::SchemaError { .. })
    }

    /// Whether a document could not be read.
    pub fn is_document_read(&self) -> bool {
        matches!(self, Self::DocumentReadError { .. })
    }

    /// Whether an embedding provider call failed.
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::EmbeddingError { .. })
    }

    /// Whether a generation provider call failed.
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::GenerationError { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_origin() {
        let err = RagError::SchemaError {
            collection: "rag_data".into(),
            message: "expected 768 dimensions, got 3".into(),
        };
        assert_eq!(err.to_string(), "Schema error (rag_data): expected 768 dimensions, got 3");
        assert!(err.is_schema());
        assert!(!err.is_connection());
    }

    #[test]
    fn io_errors_convert() {
        let err: RagError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, RagError::Io(_)));
    }
}
