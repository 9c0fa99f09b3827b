use anyhow::Result;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    println!("API URL: {}", config.api_url);
    println!("Data directory: {}", config.data_dir()?.display());
    println!("Database: {}", config.db_path()?.display());
    match Config::global_config_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not present)", path.display()),
        None => println!("Config file: (none)"),
    }
    println!(
        "Chat API key: {}",
        config.masked_chat_key().unwrap_or_else(|| "(not set)".to_string())
    );
    Ok(())
}
