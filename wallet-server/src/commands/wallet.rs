//! Wallet commands - create, move balances and inspect wallets

use anyhow::Result;
use colored::Colorize;
use uuid::Uuid;

use super::get_context;
use crate::output;

pub async fn create(balance: i64, json: bool) -> Result<()> {
    let ctx = get_context().await?;
    let wallet = ctx.wallet_service.create_wallet(balance).await?;
    ctx.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&wallet)?);
    } else {
        output::success("Wallet created");
        println!("  ID: {}", wallet.id);
        println!("  Balance: {}", wallet.balance);
    }
    Ok(())
}

pub async fn deposit(id: Uuid, amount: i64) -> Result<()> {
    let ctx = get_context().await?;
    ctx.wallet_service.deposit(id, amount).await?;
    let wallet = ctx.wallet_service.get_wallet(id).await?;
    ctx.shutdown().await;

    output::success(&format!("Deposited {} into {}", amount, id));
    println!("  Balance: {}", wallet.balance);
    Ok(())
}

pub async fn withdraw(id: Uuid, amount: i64) -> Result<()> {
    let ctx = get_context().await?;
    ctx.wallet_service.withdraw(id, amount).await?;
    let wallet = ctx.wallet_service.get_wallet(id).await?;
    ctx.shutdown().await;

    output::success(&format!("Withdrew {} from {}", amount, id));
    println!("  Balance: {}", wallet.balance);
    Ok(())
}

pub async fn show(id: Uuid, json: bool) -> Result<()> {
    let ctx = get_context().await?;
    let wallet = ctx.wallet_service.get_wallet(id).await?;
    ctx.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&wallet)?);
    } else {
        println!("{}", output::wallet_table(std::slice::from_ref(&wallet)));
    }
    Ok(())
}

pub async fn list(json: bool) -> Result<()> {
    let ctx = get_context().await?;
    let wallets = ctx.wallet_service.get_wallets().await?;
    ctx.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&wallets)?);
        return Ok(());
    }

    if wallets.is_empty() {
        println!("{}", "No wallets yet".dimmed());
        return Ok(());
    }

    let total: i128 = wallets.iter().map(|w| w.balance as i128).sum();
    println!("{}", output::wallet_table(&wallets));
    println!("{} wallets, total balance {}", wallets.len().to_string().bold(), total);
    Ok(())
}
