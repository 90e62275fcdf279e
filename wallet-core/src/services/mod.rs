//! Service layer - business logic orchestration
//!
//! Services coordinate domain rules and port interactions.

mod migration;
mod wallet;

pub use migration::{MigrationResult, MigrationService};
pub use wallet::WalletService;
