//! `smsagent status` — Show system status.

use smsagent_config::AppConfig;
use smsagent_knowledge::KnowledgeBase;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let knowledge = KnowledgeBase::from_config(&config.knowledge).status();
    let configured = |set: bool| if set { "configured" } else { "not configured" };

    println!("📱 SMS Agent Stack Status");
    println!("=========================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {} ({})", config.provider.name, config.provider.base_url);
    println!("  Endpoints:    {}", config.provider.endpoint_paths.join(", "));
    println!("  API key:      {}", configured(config.has_api_key()));
    println!(
        "  Models:       fast={} balanced={} premium={} smart={}",
        config.models.fast, config.models.balanced, config.models.premium, config.models.smart
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Twilio:       {}", configured(config.sms.is_complete()));
    println!(
        "  Slack:        {}",
        configured(config.slack.bot_token.is_some() && config.slack.signing_secret.is_some())
    );
    println!(
        "  Knowledge:    {} documents from {} ({} retrieval)",
        knowledge.documents_loaded,
        config.knowledge.documents_dir.display(),
        knowledge.provider
    );

    if !knowledge.directory_exists {
        println!("\n  ⚠️  Documents directory not found");
    }

    Ok(())
}
