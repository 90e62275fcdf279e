//! Core domain entities
//!
//! Pure data structures and the error vocabulary shared by every layer.
//! No I/O happens here.

mod wallet;
pub mod result;

pub use wallet::{Operation, Wallet};
pub use result::{StorageError, WalletError};
