//! Keyword retriever.
//!
//! Scores each document by how often the query terms occur in it. Matching
//! is raw substring counting on lower-cased text, so `cat` also matches
//! inside `cats` and `concatenate`. There is no word-boundary handling.

use crate::store::Document;

pub const DEFAULT_MAX_RESULTS: usize = 3;

/// A document paired with its keyword score for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredDocument<'a> {
    pub document: &'a Document,
    pub score: usize,
}

/// Lower-cased whitespace-separated query terms.
pub fn terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Sum of non-overlapping occurrences of every term in the document.
pub fn score(terms: &[String], document: &Document) -> usize {
    let text = document.as_str().to_lowercase();
    terms.iter().map(|term| text.matches(term.as_str()).count()).sum()
}

/// Score every document, drop zero scores, order by descending score.
///
/// The sort is stable: equal scores keep their load order.
pub fn rank<'a>(query: &str, documents: &'a [Document]) -> Vec<ScoredDocument<'a>> {
    let terms = terms(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredDocument<'a>> = documents
        .iter()
        .map(|document| ScoredDocument {
            document,
            score: score(&terms, document),
        })
        .filter(|s| s.score > 0)
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// The top `max_results` documents for `query`.
pub fn search<'a>(query: &str, documents: &'a [Document], max_results: usize) -> Vec<&'a Document> {
    rank(query, documents)
        .into_iter()
        .take(max_results)
        .map(|s| s.document)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts.iter().map(|t| Document::from(*t)).collect()
    }

    #[test]
    fn substring_matches_count() {
        let documents = docs(&["the cat sat", "the dog ran", "cats and dogs"]);
        let ranked = rank("cat", &documents);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].document.as_str(), "the cat sat");
        assert_eq!(ranked[0].score, 1);
        assert_eq!(ranked[1].document.as_str(), "cats and dogs");
        assert_eq!(ranked[1].score, 1);
    }

    #[test]
    fn higher_scores_first() {
        let documents = docs(&["rust", "rust rust rust", "rust rust"]);
        let results = search("rust", &documents, 3);
        let texts: Vec<&str> = results.iter().map(|d| d.as_str()).collect();
        assert_eq!(texts, vec!["rust rust rust", "rust rust", "rust"]);
    }

    #[test]
    fn scores_sum_across_terms_case_insensitively() {
        let documents = docs(&["SMS integration guide: SMS via Twilio"]);
        let t = terms("sms TWILIO");
        assert_eq!(score(&t, &documents[0]), 3);
    }

    #[test]
    fn occurrences_do_not_overlap() {
        let t = terms("aa");
        assert_eq!(score(&t, &Document::from("aaaa")), 2);
        assert_eq!(score(&t, &Document::from("aaa")), 1);
    }

    #[test]
    fn max_results_caps_output() {
        let documents = docs(&["a x", "b x", "c x", "d x"]);
        assert_eq!(search("x", &documents, 3).len(), 3);
        assert_eq!(search("x", &documents, 1)[0].as_str(), "a x");
        assert!(search("x", &documents, 0).is_empty());
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        let documents = docs(&["something"]);
        assert!(search("   ", &documents, 3).is_empty());
        assert!(search("", &documents, 3).is_empty());
        assert!(search("something", &[], 3).is_empty());
    }

    #[test]
    fn unmatched_documents_excluded() {
        let documents = docs(&["apples", "oranges"]);
        assert!(search("banana", &documents, 3).is_empty());
    }
}
