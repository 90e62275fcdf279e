//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The balance
//! service depends only on these traits, not on a concrete database.

mod repository;

pub use repository::WalletRepository;
