pub mod ask;
pub mod doctor;
pub mod ping;
pub mod search;
pub mod serve;
pub mod status;

use smsagent_config::AppConfig;
use smsagent_core::error::Error;
use smsagent_knowledge::KnowledgeBase;
use smsagent_providers::CompletionClient;
use std::path::Path;
use std::sync::Arc;

/// Load config from `path` (or the default location) plus environment overrides.
pub fn load_config(path: Option<&Path>) -> smsagent_core::Result<AppConfig> {
    let result = match path {
        Some(path) => AppConfig::load_with_overrides(path),
        None => AppConfig::load(),
    };
    result.map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

/// Build the completion client with the knowledge base attached.
///
/// Prints setup instructions when the API key is missing.
pub fn build_client(
    config: &AppConfig,
    knowledge: Arc<KnowledgeBase>,
) -> smsagent_core::Result<CompletionClient> {
    match CompletionClient::new(&config.provider, config.models.clone()) {
        Ok(client) => Ok(client.with_context(knowledge)),
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set the API key in the environment:");
            eprintln!("    export HYPERMODE_API_KEY='...'");
            eprintln!();
            eprintln!("  Or add it to your config file under [provider]:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            Err(e.into())
        }
    }
}
