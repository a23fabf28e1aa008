//! `smsagent ask` — Run a single message through the pipeline.

use smsagent_knowledge::KnowledgeBase;
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    config_path: Option<&Path>,
    message: &str,
    from: &str,
    model: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let knowledge = Arc::new(KnowledgeBase::from_config(&config.knowledge));
    let client = super::build_client(&config, knowledge)?;

    let reply = client.generate_response(message, from, model).await;
    println!("{reply}");

    Ok(())
}
