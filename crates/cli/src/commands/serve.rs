//! `smsagent serve` — Start the webhook gateway.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📱 SMS Agent Stack");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Documents:  {}", config.knowledge.documents_dir.display());
    println!("   SMS:        POST /sms");
    println!("   Slack:      POST /slack/events");

    smsagent_gateway::start(config).await?;

    Ok(())
}
