//! `hubblet doctor`: Diagnose system health.

use hubblet_agent::ChatOrchestrator;
use hubblet_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Hubblet Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `hubblet onboard`)");
    }
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            return Ok(());
        }
    };

    // Data directory
    let data_dir = config.storage.data_dir();
    if data_dir.exists() {
        println!("  ✅ Data directory: {}", data_dir.display());
    } else {
        println!("  ⚠️  No data directory yet — it is created on first save");
    }

    let orchestrator = ChatOrchestrator::from_config(&config);

    // Language model
    match orchestrator.provider() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Language model reachable ({})", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Language model endpoint answered with an error");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Language model unreachable: {e}");
                issues += 1;
            }
        },
        None => {
            println!("  ⚠️  No API key configured — chat and document search are disabled");
            issues += 1;
        }
    }

    // Memory
    let memory = orchestrator.memory().name();
    if memory == "none" {
        println!("  ⚠️  Long-term memory disabled");
        issues += 1;
    } else {
        println!("  ✅ Long-term memory: {memory}");
    }

    // Stored assistants
    let assistants = orchestrator.profiles().list();
    println!("  ✅ {} saved assistant(s)", assistants.len());

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
