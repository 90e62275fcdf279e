//! Error types for the storage and service layers

use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a storage backend through the repository port
///
/// Backends translate their own failure signals into `NotFound` and
/// `ConstraintViolation`; everything else is carried as `Database`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("wallet not found: {0}")]
    NotFound(Uuid),

    #[error("balance must be gte 0")]
    ConstraintViolation,

    #[error("database error: {0}")]
    Database(String),
}

impl StorageError {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

/// Outcomes of a ledger operation that are visible to clients
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("invalid id")]
    InvalidId,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("amount must be gte 0")]
    InvalidAmount,

    #[error("balance must be gte 0")]
    NegativeBalance,

    #[error("unclassified failure: {0}")]
    Unclassified(#[source] StorageError),
}

/// Repository result type
pub type Result<T> = std::result::Result<T, StorageError>;
