//! Context assembly — turns retrieval results into a bounded prompt snippet.

use crate::store::Document;
use smsagent_config::KnowledgeConfig;

/// Header placed before the context inside the user turn.
pub const CONTEXT_HEADER: &str = "Relevant information from knowledge base:";

/// Separator between joined documents.
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// How much retrieved text makes it into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    /// Documents retrieved per query
    pub max_results: usize,
    /// Documents joined into the context (a prefix of the results)
    pub documents: usize,
    /// Hard character cap on the joined text
    pub max_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_results: 3,
            documents: 2,
            max_chars: 1000,
        }
    }
}

impl From<&KnowledgeConfig> for ContextLimits {
    fn from(config: &KnowledgeConfig) -> Self {
        Self {
            max_results: config.max_results,
            documents: config.context_documents,
            max_chars: config.context_max_chars,
        }
    }
}

/// Join the leading results and cap the length. `None` when nothing matched.
pub fn assemble(results: &[&Document], limits: ContextLimits) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let joined = results
        .iter()
        .take(limits.documents)
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR);

    let context = truncate_chars(&joined, limits.max_chars);
    (!context.is_empty()).then_some(context)
}

/// The first `max_chars` characters of `text`. Cuts mid-word.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
