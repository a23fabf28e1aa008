//! `smsagent doctor` — Diagnose configuration.

use smsagent_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 SMS Agent Stack Doctor");
    println!("=========================\n");

    let mut issues = 0;

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            return Err("configuration could not be loaded".into());
        }
    };

    if config.has_api_key() {
        println!("  ✅ HYPERMODE_API_KEY set");
    } else {
        println!("  ❌ HYPERMODE_API_KEY missing — the assistant cannot answer");
        issues += 1;
    }

    let sms = &config.sms;
    for (name, set) in [
        ("TWILIO_ACCOUNT_SID", sms.account_sid.is_some()),
        ("TWILIO_AUTH_TOKEN", sms.auth_token.is_some()),
        ("TWILIO_PHONE_NUMBER", sms.phone_number.is_some()),
    ] {
        if set {
            println!("  ✅ {name} set");
        } else {
            println!("  ⚠️  {name} missing — outbound SMS (/respond) disabled");
            issues += 1;
        }
    }

    if config.slack.bot_token.is_some() {
        println!("  ✅ SLACK_BOT_TOKEN set");
    } else {
        println!("  ⚠️  SLACK_BOT_TOKEN missing — Slack replies disabled");
        issues += 1;
    }
    if config.slack.signing_secret.is_some() {
        println!("  ✅ SLACK_SIGNING_SECRET set");
    } else {
        println!("  ⚠️  SLACK_SIGNING_SECRET missing — Slack requests are not verified");
        issues += 1;
    }

    issues += check_documents(&config);

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

fn check_documents(config: &AppConfig) -> usize {
    let dir = &config.knowledge.documents_dir;
    if !dir.is_dir() {
        println!("  ⚠️  Documents directory {} not found", dir.display());
        return 1;
    }

    let count = smsagent_knowledge::store::load_documents(dir, &config.knowledge.extensions).len();
    if count == 0 {
        println!("  ⚠️  Documents directory {} has no readable documents", dir.display());
        1
    } else {
        println!("  ✅ {count} document(s) in {}", dir.display());
        0
    }
}
