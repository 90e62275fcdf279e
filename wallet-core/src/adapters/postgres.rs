//! PostgreSQL wallet store
//!
//! Shared backend for deployments where several server processes use the
//! same database. Balance updates lock the wallet row with
//! `SELECT ... FOR UPDATE` inside a transaction, which serializes
//! concurrent deltas on one wallet across processes.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::PostgresConfig;
use crate::domain::result::{Result, StorageError};
use crate::domain::Wallet;
use crate::migrations::{BOOTSTRAP_MIGRATION, POSTGRES_MIGRATIONS};
use crate::ports::WalletRepository;
use crate::services::MigrationResult;

/// SQLSTATE check_violation
const CHECK_VIOLATION: &str = "23514";

/// SQLSTATE integrity_constraint_violation
const INTEGRITY_CONSTRAINT_VIOLATION: &str = "23000";

/// Advisory lock key held while migrations run
const MIGRATION_LOCK_KEY: i64 = 0x7761_6c6c_6574;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(
                db_err.code().as_deref(),
                Some(CHECK_VIOLATION) | Some(INTEGRITY_CONSTRAINT_VIOLATION)
            ) {
                return StorageError::ConstraintViolation;
            }
        }
        StorageError::Database(err.to_string())
    }
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    balance: i64,
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Wallet::new(row.id, row.balance)
    }
}

/// PostgreSQL wallet store backed by a connection pool
#[derive(Clone)]
pub struct PostgresWalletStore {
    pool: PgPool,
}

impl PostgresWalletStore {
    /// Connect a pool using the configured credentials
    pub async fn connect(config: &PostgresConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url()?)
            .await?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to postgres"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run pending schema migrations
    ///
    /// Holds a transaction-scoped advisory lock so processes starting at the
    /// same time apply each migration exactly once.
    pub async fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let table_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'sys_migrations')",
        )
        .fetch_one(&mut *tx)
        .await?;

        let applied: Vec<String> = if table_exists {
            sqlx::query_scalar::<_, String>("SELECT migration_name FROM sys_migrations ORDER BY migration_name")
                .fetch_all(&mut *tx)
                .await?
        } else {
            Vec::new()
        };

        let mut result = MigrationResult {
            applied: Vec::new(),
            already_applied: applied.len(),
        };

        for (name, sql) in POSTGRES_MIGRATIONS.iter() {
            if applied.iter().any(|a| a == name) {
                continue;
            }
            sqlx::raw_sql(sql).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO sys_migrations (migration_name) VALUES ($1)")
                .bind(*name)
                .execute(&mut *tx)
                .await?;
            if *name != BOOTSTRAP_MIGRATION {
                tracing::info!(migration = %name, "applied migration");
            }
            result.applied.push(name.to_string());
        }

        tx.commit().await?;
        Ok(result)
    }

    /// Ensure database schema exists (runs pending migrations)
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations().await?;
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletStore {
    async fn save(&self, balance: i64) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO wallets (id, balance) VALUES ($1, $2)")
            .bind(id)
            .bind(balance)
            .execute(&self.pool)
            .await?;
        tracing::debug!(wallet_id = %id, balance, "wallet inserted");
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Wallet> {
        sqlx::query_as::<_, WalletRow>("SELECT id, balance FROM wallets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Wallet::from)
            .ok_or(StorageError::NotFound(id))
    }

    async fn get_all(&self) -> Result<Vec<Wallet>> {
        let rows = sqlx::query_as::<_, WalletRow>("SELECT id, balance FROM wallets")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Wallet::from).collect())
    }

    async fn update(&self, id: Uuid, delta: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Dropping `tx` on any early return rolls the transaction back.
        let current =
            sqlx::query_scalar::<_, i64>("SELECT balance FROM wallets WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Err(StorageError::NotFound(id));
        };

        sqlx::query("UPDATE wallets SET balance = balance + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(wallet_id = %id, previous = current, delta, "balance updated");
        Ok(())
    }
}
