//! Data types for documents, stored records and search results.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata key holding the file extension of a document.
pub const SOURCE_TYPE_KEY: &str = "source_type";
/// Metadata key holding the size of a document in bytes.
pub const SIZE_BYTES_KEY: &str = "size_bytes";

/// A reference to a pending document in the staging location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentRef {
    /// Stable identifier (the file name).
    pub id: String,
    /// Location of the document.
    pub path: PathBuf,
}

/// A document read from the staging location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier (the file name).
    pub id: String,
    /// Location the document was read from.
    pub path: PathBuf,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata such as source type and size.
    pub metadata: HashMap<String, String>,
}

/// A row owned by the vector store after insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionRecord {
    /// Primary key assigned by the store.
    pub id: i64,
    /// The original text.
    pub text: String,
    /// The text's embedding.
    pub embedding: Vec<f32>,
}

/// A retrieved record paired with its score under the collection metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Primary key of the record.
    pub id: i64,
    /// The stored text.
    pub text: String,
    /// Distance or similarity, as reported by the store.
    pub score: f32,
}
