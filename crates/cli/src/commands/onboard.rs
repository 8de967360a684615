//! `hubblet onboard`: First-time setup.

use hubblet_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🤖 Hubblet — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let profile_dir = config.storage.profile_dir();
    if !profile_dir.exists() {
        std::fs::create_dir_all(&profile_dir)?;
        println!("✅ Created assistants directory: {}", profile_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set OPENAI_API_KEY (and MEM0_API_KEY for long-term memory)");
        println!("   2. Run: hubblet create");
        println!("   3. Run: hubblet chat <assistant>\n");
    }

    println!("🎉 Setup complete!\n");

    Ok(())
}
