//! Document sources for `rag-ingest`.
//!
//! Records written to an in-memory store vanish when the process exits, so a
//! run against one must leave the staging directory as it found it.

use std::path::PathBuf;
use std::sync::Arc;

use rag_support::{DirectorySource, Document, DocumentRef, DocumentSource, IngestConfig, Result};
use tracing::debug;

/// The staging directory as a source; documents are only archived when the
/// records outlive the process.
pub fn ingest_source(config: &IngestConfig, in_memory: bool) -> Arc<dyn DocumentSource> {
    let source = DirectorySource::new(&config.staging_dir, &config.processed_dir);
    if in_memory { Arc::new(KeepStaged::new(source)) } else { Arc::new(source) }
}

/// Wraps a source so that archiving leaves documents where they are.
#[derive(Debug, Clone)]
pub struct KeepStaged<S> {
    inner: S,
}

impl<S: DocumentSource> KeepStaged<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: DocumentSource> DocumentSource for KeepStaged<S> {
    fn list_pending(&self) -> Result<Vec<DocumentRef>> {
        self.inner.list_pending()
    }

    fn read(&self, document: &DocumentRef) -> Result<Document> {
        self.inner.read(document)
    }

    fn archive(&self, document: &DocumentRef) -> Result<PathBuf> {
        debug!(document = %document.id, "leaving document staged");
        Ok(document.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn staged_config(root: &Path) -> IngestConfig {
        let staging = root.join("ingest");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("a.txt"), "alpha").unwrap();
        IngestConfig::builder()
            .staging_dir(staging)
            .processed_dir(root.join("processed"))
            .build()
            .unwrap()
    }

    #[test]
    fn archive_keeps_the_file_pending() {
        let temp = tempfile::tempdir().unwrap();
        let config = staged_config(temp.path());
        let (staging, processed) = (&config.staging_dir, &config.processed_dir);
        let source = KeepStaged::new(DirectorySource::new(staging, processed));

        let pending = source.list_pending().unwrap();
        assert_eq!(source.read(&pending[0]).unwrap().text, "alpha");
        let location = source.archive(&pending[0]).unwrap();

        assert_eq!(location, staging.join("a.txt"));
        assert!(location.exists());
        assert!(!processed.exists());
        assert_eq!(source.list_pending().unwrap(), pending);
    }

    #[test]
    fn only_in_memory_runs_leave_documents_staged() {
        let temp = tempfile::tempdir().unwrap();
        let config = staged_config(temp.path());

        let kept = ingest_source(&config, true);
        kept.archive(&kept.list_pending().unwrap()[0]).unwrap();
        assert_eq!(kept.list_pending().unwrap().len(), 1);

        let moved = ingest_source(&config, false);
        let target = moved.archive(&moved.list_pending().unwrap()[0]).unwrap();
        assert_eq!(target, config.processed_dir.join("a.txt"));
        assert!(moved.list_pending().unwrap().is_empty());
    }
}
