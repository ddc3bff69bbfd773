//! Document source: the staging location pending documents are taken from.
//!
//! [`DirectorySource`] lists the regular files directly inside a staging
//! directory in path order, so a re-run after a partial failure sees the
//! remaining documents in the same relative order as the first run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{Document, DocumentRef, SIZE_BYTES_KEY, SOURCE_TYPE_KEY};
use crate::error::{RagError, Result};

/// A location holding documents that are waiting to be ingested.
pub trait DocumentSource: Send + Sync {
    /// List pending documents sorted by path.
    ///
    /// Returns an empty `Vec` when nothing is pending.
    fn list_pending(&self) -> Result<Vec<DocumentRef>>;

    /// Read a pending document.
    ///
    /// Fails with [`RagError::DocumentReadError`] naming the document.
    fn read(&self, document: &DocumentRef) -> Result<Document>;

    /// Move a document out of the pending set, returning its new location.
    fn archive(&self, document: &DocumentRef) -> Result<PathBuf>;
}

/// A [`DocumentSource`] backed by a staging and a processed directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    staging_dir: PathBuf,
    processed_dir: PathBuf,
}

impl DirectorySource {
    /// Create a source over the given directories.
    pub fn new(staging_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self { staging_dir: staging_dir.into(), processed_dir: processed_dir.into() }
    }

    /// Directory holding pending documents.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Directory receiving archived documents.
    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }
}

fn read_error(document: &DocumentRef, message: impl Into<String>) -> RagError {
    RagError::DocumentReadError { document: document.id.clone(), message: message.into() }
}

impl DocumentSource for DirectorySource {
    fn list_pending(&self) -> Result<Vec<DocumentRef>> {
        let root = &self.staging_dir;
        if !root.exists() {
            debug!(staging_dir = %root.display(), "staging directory missing, nothing pending");
            return Ok(Vec::new());
        }
        if !root.is_dir() {
            return Err(RagError::SourceError(format!(
                "staging path '{}' is not a directory",
                root.display()
            )));
        }

        let mut pending = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                RagError::SourceError(format!("failed to list '{}': {e}", root.display()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            pending.push(DocumentRef { id, path: entry.into_path() });
        }

        pending.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(staging_dir = %root.display(), pending = pending.len(), "listed pending documents");
        Ok(pending)
    }

    fn read(&self, document: &DocumentRef) -> Result<Document> {
        let bytes = fs::read(&document.path).map_err(|e| read_error(document, e.to_string()))?;
        let size = bytes.len();
        let text = String::from_utf8(bytes)
            .map_err(|e| read_error(document, format!("not valid UTF-8: {e}")))?;

        let source_type = document
            .path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = HashMap::from([
            (SOURCE_TYPE_KEY.to_string(), source_type),
            (SIZE_BYTES_KEY.to_string(), size.to_string()),
        ]);

        Ok(Document { id: document.id.clone(), path: document.path.clone(), text, metadata })
    }

    fn archive(&self, document: &DocumentRef) -> Result<PathBuf> {
        fs::create_dir_all(&self.processed_dir).map_err(|e| {
            RagError::SourceError(format!(
                "failed to create processed directory '{}': {e}",
                self.processed_dir.display()
            ))
        })?;

        let target = self.processed_dir.join(&document.id);
        if let Err(rename_err) = fs::rename(&document.path, &target) {
            // rename cannot cross filesystems
            warn!(
                document.id = %document.id,
                error = %rename_err,
                "rename failed, copying instead"
            );
            fs::copy(&document.path, &target)
                .and_then(|_| fs::remove_file(&document.path))
                .map_err(|e| {
                    RagError::SourceError(format!("failed to archive '{}': {e}", document.id))
                })?;
        }

        debug!(document.id = %document.id, target = %target.display(), "archived document");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_in(root: &Path) -> DirectorySource {
        DirectorySource::new(root.join("ingest"), root.join("processed"))
    }

    #[test]
    fn lists_files_in_path_order() {
        let temp = tempfile::tempdir().unwrap();
        let source = source_in(temp.path());
        fs::create_dir_all(source.staging_dir().join("nested")).unwrap();
        for name in ["b.txt", "a.txt", "c.txt"] {
            fs::write(source.staging_dir().join(name), name).unwrap();
        }
        fs::write(source.staging_dir().join("nested/z.txt"), "skip").unwrap();

        let ids: Vec<String> = source.list_pending().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn empty_or_missing_staging_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let source = source_in(temp.path());
        assert!(source.list_pending().unwrap().is_empty());

        fs::create_dir_all(source.staging_dir()).unwrap();
        assert!(source.list_pending().unwrap().is_empty());
    }

    #[test]
    fn staging_path_that_is_a_file_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("ingest"), "oops").unwrap();
        let err = source_in(temp.path()).list_pending().unwrap_err();
        assert!(matches!(err, RagError::SourceError(_)));
    }

    #[test]
    fn read_attaches_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let source = source_in(temp.path());
        fs::create_dir_all(source.staging_dir()).unwrap();
        fs::write(source.staging_dir().join("Notes.MD"), "hello").unwrap();

        let pending = source.list_pending().unwrap();
        let document = source.read(&pending[0]).unwrap();
        assert_eq!(document.text, "hello");
        assert_eq!(document.metadata[SOURCE_TYPE_KEY], "md");
        assert_eq!(document.metadata[SIZE_BYTES_KEY], "5");
    }

    #[test]
    fn read_rejects_binary_content() {
        let temp = tempfile::tempdir().unwrap();
        let source = source_in(temp.path());
        fs::create_dir_all(source.staging_dir()).unwrap();
        fs::write(source.staging_dir().join("blob.bin"), b"\xff\xfe\x00").unwrap();

        let pending = source.list_pending().unwrap();
        let err = source.read(&pending[0]).unwrap_err();
        assert!(err.is_document_read());
    }

    #[test]
    fn archive_moves_the_file() {
        let temp = tempfile::tempdir().unwrap();
        let source = source_in(temp.path());
        fs::create_dir_all(source.staging_dir()).unwrap();
        fs::write(source.staging_dir().join("a.txt"), "alpha").unwrap();

        let pending = source.list_pending().unwrap();
        let target = source.archive(&pending[0]).unwrap();

        assert_eq!(target, source.processed_dir().join("a.txt"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "alpha");
        assert!(source.list_pending().unwrap().is_empty());
    }
}
