//! Collection schema types shared by the gateway and the store backends.

use serde::{Deserialize, Serialize};

/// Largest length a VARCHAR text field may declare.
pub const MAX_VARCHAR_LENGTH: usize = 65535;

/// Name of the auto-assigned primary key field.
pub const PRIMARY_KEY_FIELD: &str = "doc_id";
/// Name of the vector field.
pub const VECTOR_FIELD: &str = "embedding";
/// Name of the text field.
pub const TEXT_FIELD: &str = "text";

/// Distance metric used by a collection's vector index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistanceMetric {
    /// Euclidean distance; smaller is closer.
    L2,
    /// Inner product; larger is closer.
    #[serde(rename = "IP")]
    InnerProduct,
    /// Cosine similarity; larger is closer.
    #[default]
    Cosine,
}

impl DistanceMetric {
    /// The metric's wire name (`L2`, `IP`, `COSINE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "L2",
            Self::InnerProduct => "IP",
            Self::Cosine => "COSINE",
        }
    }

    /// Whether smaller scores rank first.
    pub fn ascending(&self) -> bool {
        matches!(self, Self::L2)
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = crate::error::RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L2" => Ok(Self::L2),
            "IP" => Ok(Self::InnerProduct),
            "COSINE" => Ok(Self::Cosine),
            other => Err(crate::error::RagError::ConfigError(format!(
                "unknown distance metric '{other}'"
            ))),
        }
    }
}

/// Data type of a collection field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldType {
    /// 64-bit integer.
    Int64,
    /// Dense float vector.
    FloatVector,
    /// Bounded-length string.
    VarChar,
}

/// One field of a [`CollectionSchema`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSchema {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub data_type: FieldType,
    /// Whether this is the primary key.
    #[serde(default)]
    pub is_primary: bool,
    /// Whether the store assigns the value.
    #[serde(default)]
    pub auto_id: bool,
    /// Vector dimension, for [`FieldType::FloatVector`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    /// Maximum length, for [`FieldType::VarChar`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// The three-field schema every RAG collection uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionSchema {
    /// Free-form description.
    pub description: String,
    /// Auto-assigned integer primary key.
    pub primary_key: FieldSchema,
    /// Fixed-dimension vector field.
    pub vector: FieldSchema,
    /// Bounded text field.
    pub text: FieldSchema,
}

impl CollectionSchema {
    /// Build the RAG schema: `doc_id` (auto INT64 key), `embedding`
    /// (`dimensions`-wide float vector) and `text` (VARCHAR of `max_text_length`).
    pub fn rag(dimensions: usize, max_text_length: usize) -> Self {
        Self {
            description: "RAG Data".to_string(),
            primary_key: FieldSchema {
                name: PRIMARY_KEY_FIELD.to_string(),
                data_type: FieldType::Int64,
                is_primary: true,
                auto_id: true,
                dim: None,
                max_length: None,
            },
            vector: FieldSchema {
                name: VECTOR_FIELD.to_string(),
                data_type: FieldType::FloatVector,
                is_primary: false,
                auto_id: false,
                dim: Some(dimensions),
                max_length: None,
            },
            text: FieldSchema {
                name: TEXT_FIELD.to_string(),
                data_type: FieldType::VarChar,
                is_primary: false,
                auto_id: false,
                dim: None,
                max_length: Some(max_text_length),
            },
        }
    }

    /// Dimension of the vector field.
    pub fn dimensions(&self) -> usize {
        self.vector.dim.unwrap_or_default()
    }

    /// Bound of the text field.
    pub fn max_text_length(&self) -> usize {
        self.text.max_length.unwrap_or(MAX_VARCHAR_LENGTH)
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> [&FieldSchema; 3] {
        [&self.primary_key, &self.vector, &self.text]
    }
}

/// Result of [`ensure_collection`](crate::gateway::VectorStoreGateway::ensure_collection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// The collection did not exist and was created.
    Created,
    /// The collection already existed; its schema was left untouched.
    Existing,
}

/// Administrative view of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionDescription {
    /// Collection name.
    pub name: String,
    /// The collection's schema.
    pub schema: CollectionSchema,
    /// Number of persisted rows.
    pub row_count: u64,
    /// Whether the collection is loaded for search.
    pub loaded: bool,
}
