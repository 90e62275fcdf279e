//! walletd - wallet balance ledger server and admin CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

mod api;
mod commands;
mod logging;
mod output;

use commands::{migrate, serve, wallet};
use logging::{init_logging, LogFormat};

/// walletd - wallet balance ledger
#[derive(Parser)]
#[command(name = "walletd", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind, overrides settings
        #[arg(long, env = "ADDRESS")]
        address: Option<String>,
        /// Log output format
        #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
        log_format: LogFormat,
    },

    /// Apply pending schema migrations
    Migrate,

    /// Create a wallet
    Create {
        /// Initial balance
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        balance: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add to a wallet's balance
    Deposit {
        /// Wallet ID
        id: Uuid,
        /// Amount to add
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Take from a wallet's balance
    Withdraw {
        /// Wallet ID
        id: Uuid,
        /// Amount to take
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Show one wallet
    Show {
        /// Wallet ID
        id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all wallets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Deployment overrides (DB_HOST, ADDRESS, ...) from config.env, if present
    let _ = dotenvy::from_filename("config.env");

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Default filter for the server when `RUST_LOG` is unset
const SERVER_LOG_LEVEL: &str = "wallet_core=info,wallet_server=info,tower_http=info";

async fn run(cli: Cli) -> Result<()> {
    // One-shot commands only surface warnings; their output goes to stdout
    match &cli.command {
        Commands::Serve { log_format, .. } => init_logging(SERVER_LOG_LEVEL, *log_format),
        _ => init_logging("warn", LogFormat::Pretty),
    }

    match cli.command {
        Commands::Serve { address, .. } => serve::run(address).await,
        Commands::Migrate => migrate::run().await,
        Commands::Create { balance, json } => wallet::create(balance, json).await,
        Commands::Deposit { id, amount } => wallet::deposit(id, amount).await,
        Commands::Withdraw { id, amount } => wallet::withdraw(id, amount).await,
        Commands::Show { id, json } => wallet::show(id, json).await,
        Commands::List { json } => wallet::list(json).await,
    }
}
