pub mod assistants;
pub mod chat;
pub mod config_cmd;
pub mod configure;
pub mod doctor;
pub mod onboard;
pub mod prompt;
pub mod sessions;

use hubblet_config::AppConfig;

/// Load configuration or explain why it could not be loaded.
pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Print non-fatal warnings the way every command does.
pub(crate) fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("  ⚠️  {w}");
    }
}

/// The setup hint shown when no language-model key is configured.
pub(crate) fn missing_key_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    OPENAI_API_KEY  = 'sk-...'");
    eprintln!("    HUBBLET_API_KEY = 'sk-...'   (any OpenAI-compatible endpoint)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}
