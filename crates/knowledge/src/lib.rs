//! Knowledge base for the SMS Agent Stack.
//!
//! A flat directory of `.txt` / `.md` files is loaded into memory and
//! searched with a keyword count. The best matches are folded into a short
//! context snippet that the completion client appends to the prompt.
//!
//! - [`store`] — document loading and atomic reload
//! - [`retriever`] — keyword scoring and ranking
//! - [`context`] — bounded context assembly

pub mod context;
pub mod retriever;
pub mod store;

pub use context::{CONTEXT_HEADER, ContextLimits};
pub use store::{Document, DocumentStore};

use serde::Serialize;
use smsagent_config::KnowledgeConfig;
use smsagent_core::error::KnowledgeError;
use tracing::debug;

/// Anything that can supply prompt context for a query.
///
/// The completion client only sees this trait, so retrieval can be swapped
/// or stubbed without touching the request pipeline.
pub trait ContextSource: Send + Sync {
    /// Context for `query`, or `None` when nothing relevant was found.
    fn build_context(&self, query: &str) -> Result<Option<String>, KnowledgeError>;
}

/// Snapshot of the knowledge base for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeStatus {
    pub initialized: bool,
    /// Retrieval backend name
    pub provider: &'static str,
    pub documents_loaded: usize,
    pub directory_exists: bool,
}

/// The document store plus retrieval settings.
pub struct KnowledgeBase {
    store: DocumentStore,
    limits: ContextLimits,
}

impl KnowledgeBase {
    pub const PROVIDER: &'static str = "keyword";

    pub fn new(store: DocumentStore, limits: ContextLimits) -> Self {
        Self { store, limits }
    }

    /// Build and load a knowledge base from configuration.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        let store = DocumentStore::open(&config.documents_dir, config.extensions.clone());
        Self::new(store, ContextLimits::from(config))
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Texts of the top `max_results` documents for `query`.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<String> {
        let documents = self.store.snapshot();
        retriever::search(query, &documents, max_results)
            .into_iter()
            .map(|d| d.as_str().to_string())
            .collect()
    }

    /// Re-read the documents directory and describe the result.
    pub fn reload(&self) -> String {
        let count = self.store.reload();
        if self.store.directory_exists() {
            format!(
                "Reloaded {count} documents from {}",
                self.store.directory().display()
            )
        } else {
            format!(
                "Documents directory {} not found; knowledge base is empty",
                self.store.directory().display()
            )
        }
    }

    pub fn status(&self) -> KnowledgeStatus {
        KnowledgeStatus {
            initialized: self.store.is_initialized(),
            provider: Self::PROVIDER,
            documents_loaded: self.store.len(),
            directory_exists: self.store.directory_exists(),
        }
    }
}

impl ContextSource for KnowledgeBase {
    fn build_context(&self, query: &str) -> Result<Option<String>, KnowledgeError> {
        if !self.store.is_initialized() {
            return Err(KnowledgeError::NotInitialized);
        }

        let documents = self.store.snapshot();
        let results = retriever::search(query, &documents, self.limits.max_results);
        debug!(matches = results.len(), "Keyword retrieval complete");

        Ok(context::assemble(&results, self.limits))
    }
}
