//! Configuration for the vector store, the ingestion run and the query path.
//!
//! Every orchestrator receives its configuration explicitly. Nothing in this
//! crate reads the environment; loading settings is the caller's concern.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::schema::{DistanceMetric, MAX_VARCHAR_LENGTH};

/// Batch size used when none, or an unusable one, is supplied.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default maximum answer length in characters.
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 200;

/// Parse a batch-size argument, falling back to [`DEFAULT_BATCH_SIZE`].
///
/// Missing, non-numeric, negative and zero inputs all yield the default.
///
/// ```rust
/// use rag_support::config::parse_batch_size;
///
/// assert_eq!(parse_batch_size(Some("25")), 25);
/// assert_eq!(parse_batch_size(Some("lots")), 1000);
/// assert_eq!(parse_batch_size(None), 1000);
/// ```
pub fn parse_batch_size(arg: Option<&str>) -> usize {
    arg.and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Connection and collection settings for the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Name under which the connection is registered.
    pub alias: String,
    /// Vector store host.
    pub host: String,
    /// Vector store port.
    pub port: u16,
    /// Target collection name.
    pub collection: String,
    /// Dimension of the collection's vector field.
    pub dimensions: usize,
    /// Maximum length of the text field in characters.
    pub max_text_length: usize,
    /// Distance metric used to rank search results.
    pub metric: DistanceMetric,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            alias: "default".to_string(),
            host: "localhost".to_string(),
            port: 19530,
            collection: "rag_data".to_string(),
            dimensions: 768,
            max_text_length: MAX_VARCHAR_LENGTH,
            metric: DistanceMetric::default(),
        }
    }
}

impl StoreConfig {
    /// Create a new builder for constructing a [`StoreConfig`].
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`StoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the connection alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.config.alias = alias.into();
        self
    }

    /// Set the vector store host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the vector store port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the target collection.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the vector dimension.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Set the text field bound.
    pub fn max_text_length(mut self, length: usize) -> Self {
        self.config.max_text_length = length;
        self
    }

    /// Set the distance metric.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Build the [`StoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - the alias or host is empty
    /// - the collection name is not a valid identifier
    /// - `dimensions == 0`
    /// - `max_text_length` is zero or above [`MAX_VARCHAR_LENGTH`]
    pub fn build(self) -> Result<StoreConfig> {
        let config = self.config;
        if config.alias.trim().is_empty() {
            return Err(RagError::ConfigError("alias must not be empty".to_string()));
        }
        if config.host.trim().is_empty() {
            return Err(RagError::ConfigError("host must not be empty".to_string()));
        }
        validate_collection_name(&config.collection)?;
        if config.dimensions == 0 {
            return Err(RagError::ConfigError("dimensions must be greater than zero".to_string()));
        }
        if config.max_text_length == 0 || config.max_text_length > MAX_VARCHAR_LENGTH {
            return Err(RagError::ConfigError(format!(
                "max_text_length ({}) must be between 1 and {MAX_VARCHAR_LENGTH}",
                config.max_text_length
            )));
        }
        Ok(config)
    }
}

/// Check that a collection name starts with a letter or underscore and
/// contains only ASCII letters, digits and underscores.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RagError::ConfigError(format!("invalid collection name '{name}'")))
    }
}

/// Settings for one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Maximum number of documents attempted per run.
    pub batch_size: usize,
    /// Directory holding documents not yet ingested.
    pub staging_dir: PathBuf,
    /// Directory receiving documents after successful ingestion.
    pub processed_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            staging_dir: PathBuf::from("ingest"),
            processed_dir: PathBuf::from("processed"),
        }
    }
}

impl IngestConfig {
    /// Create a new builder for constructing an [`IngestConfig`].
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`IngestConfig`].
#[derive(Debug, Clone, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// Set the batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the staging directory.
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = dir.into();
        self
    }

    /// Set the processed directory.
    pub fn processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.processed_dir = dir.into();
        self
    }

    /// Build the [`IngestConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `batch_size == 0`
    /// - the staging and processed directories are the same path
    pub fn build(self) -> Result<IngestConfig> {
        if self.config.batch_size == 0 {
            return Err(RagError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        if self.config.staging_dir == self.config.processed_dir {
            return Err(RagError::ConfigError(format!(
                "staging and processed directories must differ (both '{}')",
                self.config.staging_dir.display()
            )));
        }
        Ok(self.config)
    }
}

/// Settings for the query path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryConfig {
    /// Number of context records retrieved per question.
    pub top_k: usize,
    /// Maximum answer length in characters.
    pub max_answer_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { top_k: 4, max_answer_chars: DEFAULT_MAX_ANSWER_CHARS }
    }
}

impl QueryConfig {
    /// Create a new builder for constructing a [`QueryConfig`].
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`QueryConfig`].
#[derive(Debug, Clone, Default)]
pub struct QueryConfigBuilder {
    config: QueryConfig,
}

impl QueryConfigBuilder {
    /// Set the number of retrieved context records.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum answer length in characters.
    pub fn max_answer_chars(mut self, max: usize) -> Self {
        self.config.max_answer_chars = max;
        self
    }

    /// Build the [`QueryConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k` or `max_answer_chars` is zero.
    pub fn build(self) -> Result<QueryConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.max_answer_chars == 0 {
            return Err(RagError::ConfigError(
                "max_answer_chars must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
