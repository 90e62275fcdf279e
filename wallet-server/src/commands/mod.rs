//! CLI command implementations

pub mod migrate;
pub mod serve;
pub mod wallet;

use std::path::PathBuf;

use anyhow::{Context, Result};
use wallet_core::config::Config;
use wallet_core::WalletContext;

/// Get the wallet directory from environment or default
pub fn get_wallet_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WALLET_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".wallet-ledger"))
}

/// Load configuration from the wallet directory
pub fn load_config() -> Result<Config> {
    let wallet_dir = get_wallet_dir()?;

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&wallet_dir)
        .with_context(|| format!("Failed to create wallet directory: {:?}", wallet_dir))?;

    Config::load(&wallet_dir).context("Failed to load configuration")
}

/// Open storage with the schema brought up to date
pub async fn get_context() -> Result<WalletContext> {
    let config = load_config()?;
    WalletContext::new(config)
        .await
        .context("Failed to initialize wallet context")
}
