//! Wallet service - balance accounting rules
//!
//! Validates deltas, pre-checks sufficiency before writing and maps
//! repository failures onto [`WalletError`]. Nothing is retried: a
//! constraint violation at write time is a terminal outcome.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Operation, StorageError, Wallet, WalletError};
use crate::ports::WalletRepository;

/// Wallet service for creating wallets and moving balances
///
/// Stateless apart from the injected repository; holds no cached balances.
#[derive(Clone)]
pub struct WalletService {
    repository: Arc<dyn WalletRepository>,
}

impl WalletService {
    pub fn new(repository: Arc<dyn WalletRepository>) -> Self {
        Self { repository }
    }

    /// Create a wallet seeded with `balance`
    ///
    /// Storage is authoritative for the non-negative rule; its constraint
    /// violation is reported as `NegativeBalance`.
    pub async fn create_wallet(&self, balance: i64) -> Result<Wallet, WalletError> {
        match self.repository.save(balance).await {
            Ok(id) => {
                tracing::info!(wallet_id = %id, balance, "wallet created");
                Ok(Wallet::new(id, balance))
            }
            Err(StorageError::ConstraintViolation) => Err(WalletError::NegativeBalance),
            Err(e) => Err(WalletError::Unclassified(e)),
        }
    }

    pub async fn deposit(&self, id: Uuid, amount: i64) -> Result<(), WalletError> {
        self.apply(Operation::Deposit, id, amount).await
    }

    pub async fn withdraw(&self, id: Uuid, amount: i64) -> Result<(), WalletError> {
        self.apply(Operation::Withdraw, id, amount).await
    }

    /// Apply a deposit or withdrawal of a non-negative `amount`
    pub async fn apply(
        &self,
        operation: Operation,
        id: Uuid,
        amount: i64,
    ) -> Result<(), WalletError> {
        if amount < 0 {
            return Err(WalletError::InvalidAmount);
        }
        self.apply_delta(id, operation.delta(amount)).await?;
        tracing::info!(wallet_id = %id, %operation, amount, "balance changed");
        Ok(())
    }

    async fn apply_delta(&self, id: Uuid, delta: i64) -> Result<(), WalletError> {
        let wallet = self.repository.get(id).await.map_err(not_found_as_invalid_id)?;

        // Short-circuit: reject before the write when the current balance
        // already cannot cover a withdrawal.
        match wallet.balance_after(delta) {
            Some(prospective) if delta < 0 && prospective < 0 => {
                return Err(WalletError::InsufficientBalance);
            }
            Some(_) => {}
            None => return Err(WalletError::InvalidAmount),
        }

        match self.repository.update(id, delta).await {
            Ok(()) => Ok(()),
            // Another writer moved the balance between the read and the write.
            Err(StorageError::ConstraintViolation) => {
                tracing::warn!(wallet_id = %id, delta, "balance changed concurrently, withdrawal rejected");
                Err(WalletError::InsufficientBalance)
            }
            Err(e) => Err(not_found_as_invalid_id(e)),
        }
    }

    pub async fn get_wallet(&self, id: Uuid) -> Result<Wallet, WalletError> {
        self.repository.get(id).await.map_err(not_found_as_invalid_id)
    }

    pub async fn get_wallets(&self) -> Result<Vec<Wallet>, WalletError> {
        self.repository
            .get_all()
            .await
            .map_err(WalletError::Unclassified)
    }
}

/// `NotFound` becomes `InvalidId`; every other failure passes through unclassified
fn not_found_as_invalid_id(err: StorageError) -> WalletError {
    match err {
        StorageError::NotFound(_) => WalletError::InvalidId,
        other => WalletError::Unclassified(other),
    }
}
