//! Document store — the in-memory set of text documents used for context.
//!
//! Documents are read once from a flat directory and held as one immutable
//! generation. `reload` builds a fresh generation and swaps it in with a
//! single pointer store, so concurrent readers see either the old set or the
//! new set in full.

use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// An opaque text blob. Identified only by its content and load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Read every matching file in `directory` (non-recursive).
///
/// A missing directory yields an empty set. A file that cannot be read as
/// UTF-8 is logged and skipped. Files are returned in file-name order so a
/// generation's order does not depend on the platform's `read_dir` order.
pub fn load_documents(directory: &Path, extensions: &[String]) -> Vec<Document> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            info!(
                dir = %directory.display(),
                error = %e,
                "Documents directory not readable, knowledge base is empty"
            );
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(file = %path.display(), bytes = text.len(), "Loaded document");
                documents.push(Document::new(text));
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable document");
            }
        }
    }

    documents
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.trim_start_matches('.') == ext))
}

/// Holds the current document generation.
pub struct DocumentStore {
    directory: PathBuf,
    extensions: Vec<String>,
    documents: ArcSwap<Vec<Document>>,
    initialized: AtomicBool,
}

impl DocumentStore {
    /// Create an empty, not-yet-loaded store.
    pub fn new(directory: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            extensions,
            documents: ArcSwap::from_pointee(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Create a store and load the directory immediately.
    pub fn open(directory: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        let store = Self::new(directory, extensions);
        store.reload();
        store
    }

    /// Re-read the directory and swap in the new generation.
    ///
    /// Returns the number of documents now held.
    pub fn reload(&self) -> usize {
        let documents = load_documents(&self.directory, &self.extensions);
        let count = documents.len();
        self.documents.store(Arc::new(documents));
        self.initialized.store(true, Ordering::Release);
        info!(dir = %self.directory.display(), count, "Document store loaded");
        count
    }

    /// The current generation. Holding the snapshot keeps it alive across a
    /// concurrent reload.
    pub fn snapshot(&self) -> Arc<Vec<Document>> {
        self.documents.load_full()
    }

    pub fn len(&self) -> usize {
        self.documents.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn directory_exists(&self) -> bool {
        self.directory.is_dir()
    }
}
