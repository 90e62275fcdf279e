//! Migrate command - apply pending schema migrations

use anyhow::{Context, Result};
use wallet_core::WalletContext;

use super::load_config;
use crate::output;

pub async fn run() -> Result<()> {
    let ctx = WalletContext::open(load_config()?)
        .await
        .context("Failed to open storage")?;
    let result = ctx.run_migrations().await?;
    ctx.shutdown().await;

    if result.applied.is_empty() {
        output::success(&format!(
            "Schema up to date ({} migrations applied previously)",
            result.already_applied
        ));
    } else {
        output::success(&format!("Applied {} migration(s)", result.applied.len()));
        for name in &result.applied {
            println!("  {}", name);
        }
    }
    Ok(())
}
