//! `hubblet config`: Configuration management commands.

use hubblet_config::{AppConfig, MemoryBackend};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = advisories(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Endpoint:   {}", config.api_url);
            println!("   Model:      {}", config.chat_model);
            println!("   Embeddings: {}", config.embedding_model);
            println!("   Memory:     {:?}", config.memory.backend);
            println!("   Data dir:   {}", config.storage.data_dir().display());
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Problems that do not stop Hubblet but disable a feature.
fn advisories(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set OPENAI_API_KEY or HUBBLET_API_KEY); chat and documents are disabled");
    }
    if config.memory.backend == MemoryBackend::Hosted && config.memory.api_key.is_none() {
        warnings.push("Hosted memory selected without MEM0_API_KEY; long-term memory is disabled");
    }
    if config.retrieval.chunk_size < 100 {
        warnings.push("retrieval.chunk_size is very small; chunks may lose context");
    }
    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut shown = config.clone();
    shown.api_key = shown.api_key.map(|_| "***".into());
    shown.memory.api_key = shown.memory.api_key.map(|_| "***".into());
    let toml_str = toml::to_string_pretty(&shown)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
