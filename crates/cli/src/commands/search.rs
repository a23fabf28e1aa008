//! `smsagent search` — Query the knowledge base.

use smsagent_knowledge::KnowledgeBase;
use smsagent_knowledge::context::truncate_chars;
use std::path::Path;

const PREVIEW_CHARS: usize = 200;

pub fn run(
    config_path: Option<&Path>,
    query: &str,
    max_results: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let knowledge = KnowledgeBase::from_config(&config.knowledge);
    let max_results = max_results.unwrap_or(config.knowledge.max_results);

    let results = knowledge.search(query, max_results);
    if results.is_empty() {
        println!("No matching documents for \"{query}\"");
        return Ok(());
    }

    println!("🔎 {} result(s) for \"{query}\"\n", results.len());
    for (i, text) in results.iter().enumerate() {
        let preview = truncate_chars(text, PREVIEW_CHARS);
        let ellipsis = if preview.len() < text.len() { "…" } else { "" };
        println!("  {}. {preview}{ellipsis}\n", i + 1);
    }

    Ok(())
}
