//! Wallet Core - balance ledger for wallets
//!
//! This crate implements the ledger following hexagonal architecture:
//!
//! - **domain**: Wallet, operations and error types
//! - **ports**: The `WalletRepository` storage trait
//! - **services**: Balance rules and schema migrations
//! - **adapters**: DuckDB and PostgreSQL repositories

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;

use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbWalletStore;
use adapters::postgres::PostgresWalletStore;
use config::{Config, StorageConfig};

// Re-export commonly used types at crate root
pub use domain::{Operation, StorageError, Wallet, WalletError};
pub use ports::WalletRepository;
pub use services::{MigrationResult, WalletService};

/// Concrete storage behind the repository port, kept for lifecycle calls
#[derive(Clone)]
pub enum Backend {
    DuckDb(DuckDbWalletStore),
    Postgres(PostgresWalletStore),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::DuckDb(_) => "duckdb",
            Backend::Postgres(_) => "postgres",
        }
    }
}

/// Main context for wallet operations
///
/// Holds the configuration, the storage backend and the wallet service
/// wired to it.
pub struct WalletContext {
    pub config: Config,
    pub repository: Arc<dyn WalletRepository>,
    pub wallet_service: WalletService,
    backend: Backend,
}

impl WalletContext {
    /// Connect to storage and make sure the schema is current
    pub async fn new(config: Config) -> Result<Self> {
        let context = Self::open(config).await?;
        context.run_migrations().await?;
        Ok(context)
    }

    /// Connect to storage without touching the schema
    pub async fn open(config: Config) -> Result<Self> {
        let backend = match &config.storage {
            StorageConfig::DuckDb { path } => {
                let store = match path {
                    Some(path) => {
                        if let Some(parent) = path.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        DuckDbWalletStore::new(path)?
                    }
                    None => DuckDbWalletStore::open_in_memory()?,
                };
                Backend::DuckDb(store)
            }
            StorageConfig::Postgres(pg) => {
                Backend::Postgres(PostgresWalletStore::connect(pg).await?)
            }
        };

        let repository: Arc<dyn WalletRepository> = match &backend {
            Backend::DuckDb(store) => Arc::new(store.clone()),
            Backend::Postgres(store) => Arc::new(store.clone()),
        };
        let wallet_service = WalletService::new(repository.clone());

        Ok(Self {
            config,
            repository,
            wallet_service,
            backend,
        })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Apply pending schema migrations on the active backend
    pub async fn run_migrations(&self) -> Result<MigrationResult> {
        match &self.backend {
            Backend::DuckDb(store) => {
                let store = store.clone();
                tokio::task::spawn_blocking(move || store.run_migrations()).await?
            }
            Backend::Postgres(store) => store.run_migrations().await,
        }
    }

    /// Release storage resources
    pub async fn shutdown(&self) {
        match &self.backend {
            // Connections close when the last clone of the store drops
            Backend::DuckDb(_) => {}
            Backend::Postgres(store) => store.close().await,
        }
        tracing::info!(backend = self.backend.name(), "storage closed");
    }
}
