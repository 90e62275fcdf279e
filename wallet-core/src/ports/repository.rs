//! Repository port - wallet storage abstraction

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::Wallet;

/// Wallet storage abstraction
///
/// Implementations own all shared mutable state. They must enforce
/// `balance >= 0` themselves and serialize concurrent `update` calls on
/// the same wallet id; the service layer adds no locking of its own.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Insert a wallet with an initial balance and return its new id.
    ///
    /// Fails with `ConstraintViolation` when `balance < 0`.
    async fn save(&self, balance: i64) -> Result<Uuid>;

    /// Fetch a wallet by id, `NotFound` if it does not exist
    async fn get(&self, id: Uuid) -> Result<Wallet>;

    /// Fetch every wallet (order unspecified)
    async fn get_all(&self) -> Result<Vec<Wallet>>;

    /// Atomically add `delta` to a wallet's balance under an exclusive row lock.
    ///
    /// Fails with `NotFound` for an unknown id and `ConstraintViolation`
    /// when the resulting balance would be negative.
    async fn update(&self, id: Uuid, delta: i64) -> Result<()>;
}
