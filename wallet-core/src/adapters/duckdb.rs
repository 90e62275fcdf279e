//! DuckDB wallet store
//!
//! Embedded backend. Every operation runs on its own cloned connection to
//! the shared database instance; balance updates additionally hold a
//! per-wallet lock for the whole read-check-write transaction, so updates
//! to one wallet are strictly serialized while different wallets proceed
//! in parallel. The `CHECK (balance >= 0)` constraint on the table is the
//! authoritative guard against negative balances.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::result::{Result, StorageError};
use crate::domain::Wallet;
use crate::ports::WalletRepository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// DuckDB reports every constraint failure as a "Constraint Error"; only
/// the CHECK on `balance` can fire for the statements issued here.
fn is_check_violation(err_msg: &str) -> bool {
    err_msg.to_lowercase().contains("check constraint failed")
}

impl From<duckdb::Error> for StorageError {
    fn from(err: duckdb::Error) -> Self {
        let msg = err.to_string();
        if is_check_violation(&msg) {
            StorageError::ConstraintViolation
        } else {
            StorageError::Database(msg)
        }
    }
}

/// Exclusive per-wallet locks, created on demand and dropped once unused
#[derive(Default)]
struct RowLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl RowLocks {
    /// Run `f` while holding the exclusive lock for `id`
    fn with_lock<T>(&self, id: Uuid, f: impl FnOnce() -> T) -> T {
        // The map only holds lock handles, so a poisoned guard still guards valid data.
        let row_lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };

        let result = {
            let _guard = row_lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(row_lock);

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&id);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// DuckDB wallet store
///
/// Cheap to clone; clones share the database instance and the row locks.
#[derive(Clone)]
pub struct DuckDbWalletStore {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
    row_locks: Arc<RowLocks>,
}

impl DuckDbWalletStore {
    /// Open (or create) a file-backed wallet database
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur while another process still holds the database file.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => return Ok(Self::from_connection(conn, Some(db_path.to_path_buf()))),
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// Open a private in-memory wallet database
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self::from_connection(conn, None))
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Extension autoloading stays off; the wallet schema needs none.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
            row_locks: Arc::new(RowLocks::default()),
        }
    }

    /// Path of the database file, None when in-memory
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run pending schema migrations
    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self.connection()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// A fresh connection to the shared database instance
    fn connection(&self) -> Result<Connection> {
        let base = self
            .conn
            .lock()
            .map_err(|e| StorageError::database(format!("connection lock poisoned: {}", e)))?;
        Ok(base.try_clone()?)
    }

    // === Wallet operations ===

    pub fn insert_wallet(&self, balance: i64) -> Result<Uuid> {
        let conn = self.connection()?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO wallets (id, balance) VALUES (?, ?)",
            params![id.to_string(), balance],
        )?;
        tracing::debug!(wallet_id = %id, balance, "wallet inserted");
        Ok(id)
    }

    pub fn fetch_wallet(&self, id: Uuid) -> Result<Wallet> {
        let conn = self.connection()?;
        match conn.query_row(
            "SELECT balance FROM wallets WHERE id = ?",
            params![id.to_string()],
            |row| row.get::<_, i64>(0),
        ) {
            Ok(balance) => Ok(Wallet::new(id, balance)),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(StorageError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn fetch_wallets(&self) -> Result<Vec<Wallet>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT id, balance FROM wallets")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut wallets = Vec::new();
        for row in rows {
            let (id, balance) = row?;
            let id = Uuid::parse_str(&id)
                .map_err(|e| StorageError::database(format!("corrupt wallet id {:?}: {}", id, e)))?;
            wallets.push(Wallet::new(id, balance));
        }
        Ok(wallets)
    }

    /// Add `delta` to a wallet's balance under its row lock
    pub fn apply_delta(&self, id: Uuid, delta: i64) -> Result<()> {
        self.row_locks.with_lock(id, || {
            let mut conn = self.connection()?;
            let tx = conn.transaction()?;
            let key = id.to_string();

            // Dropping `tx` on any early return rolls the transaction back.
            let current = match tx.query_row(
                "SELECT balance FROM wallets WHERE id = ?",
                params![key],
                |row| row.get::<_, i64>(0),
            ) {
                Ok(balance) => balance,
                Err(duckdb::Error::QueryReturnedNoRows) => return Err(StorageError::NotFound(id)),
                Err(e) => return Err(e.into()),
            };

            tx.execute(
                "UPDATE wallets SET balance = balance + ? WHERE id = ?",
                params![delta, key],
            )?;
            tx.commit()?;

            tracing::debug!(wallet_id = %id, previous = current, delta, "balance updated");
            Ok(())
        })
    }

    /// Run a blocking store call on tokio's blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DuckDbWalletStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StorageError::database(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl WalletRepository for DuckDbWalletStore {
    async fn save(&self, balance: i64) -> Result<Uuid> {
        self.blocking(move |store| store.insert_wallet(balance)).await
    }

    async fn get(&self, id: Uuid) -> Result<Wallet> {
        self.blocking(move |store| store.fetch_wallet(id)).await
    }

    async fn get_all(&self) -> Result<Vec<Wallet>> {
        self.blocking(|store| store.fetch_wallets()).await
    }

    async fn update(&self, id: Uuid, delta: i64) -> Result<()> {
        self.blocking(move |store| store.apply_delta(id, delta)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> DuckDbWalletStore {
        let store = DuckDbWalletStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_insert_and_fetch() {
        let store = test_store();
        let id = store.insert_wallet(1000).unwrap();

        assert_eq!(store.fetch_wallet(id).unwrap(), Wallet::new(id, 1000));
        assert_eq!(store.fetch_wallets().unwrap(), vec![Wallet::new(id, 1000)]);
    }

    #[test]
    fn test_insert_negative_balance_is_constraint_violation() {
        let store = test_store();
        assert_eq!(
            store.insert_wallet(-1),
            Err(StorageError::ConstraintViolation)
        );
        assert!(store.fetch_wallets().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_unknown_wallet_is_not_found() {
        let store = test_store();
        let id = Uuid::new_v4();
        assert_eq!(store.fetch_wallet(id), Err(StorageError::NotFound(id)));
    }

    #[test]
    fn test_apply_delta_enforces_constraint() {
        let store = test_store();
        let id = store.insert_wallet(500).unwrap();

        store.apply_delta(id, -500).unwrap();
        assert_eq!(store.fetch_wallet(id).unwrap().balance, 0);

        // The store refuses even when no caller pre-checked the balance
        assert_eq!(store.apply_delta(id, -1), Err(StorageError::ConstraintViolation));
        assert_eq!(store.fetch_wallet(id).unwrap().balance, 0);
    }

    #[test]
    fn test_apply_delta_unknown_wallet_is_not_found() {
        let store = test_store();
        let id = Uuid::new_v4();
        assert_eq!(store.apply_delta(id, 10), Err(StorageError::NotFound(id)));
    }

    #[test]
    fn test_row_locks_are_released() {
        let store = test_store();
        let id = store.insert_wallet(0).unwrap();

        store.apply_delta(id, 5).unwrap();
        let _ = store.apply_delta(Uuid::new_v4(), 5);

        assert_eq!(store.row_locks.len(), 0);
    }

    #[test]
    fn test_check_violation_detection() {
        assert!(is_check_violation(
            "Constraint Error: CHECK constraint failed: wallets"
        ));
        assert!(is_check_violation(
            "Constraint Error: CHECK constraint failed on table wallets with expression CHECK((balance >= 0))"
        ));
        assert!(!is_check_violation("IO Error: could not open file"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: Could not set lock on file \"x.duckdb\""));
        assert!(is_retryable_error("database is locked"));
        assert!(!is_retryable_error("Parser Error: syntax error"));
    }

    #[tokio::test]
    async fn test_repository_port_roundtrip() {
        let store = test_store();
        let repo: &dyn WalletRepository = &store;

        let id = repo.save(10).await.unwrap();
        repo.update(id, 5).await.unwrap();
        assert_eq!(repo.get(id).await.unwrap().balance, 15);
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }
}
