//! `smsagent ping` — Test connectivity to the completion API.

use smsagent_core::provider::ConnectionStatus;
use smsagent_knowledge::KnowledgeBase;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let knowledge = Arc::new(KnowledgeBase::from_config(&config.knowledge));
    let client = super::build_client(&config, knowledge)?;

    println!("Probing {} endpoint(s)...", client.endpoints().len());
    let report = client.test_connection().await;

    match report.status {
        ConnectionStatus::Connected => println!("  ✅ Connected"),
        ConnectionStatus::AuthenticationFailed => println!("  ❌ Authentication failed"),
        ConnectionStatus::ConnectionFailed => println!("  ❌ Connection failed"),
        ConnectionStatus::Error => println!("  ⚠️  Error"),
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
