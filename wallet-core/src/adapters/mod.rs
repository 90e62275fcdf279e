//! Adapter implementations
//!
//! Adapters implement the [`WalletRepository`](crate::ports::WalletRepository)
//! port with concrete storage engines:
//! - DuckDB, embedded, single process
//! - PostgreSQL, shared between server processes

pub mod duckdb;
pub mod postgres;
