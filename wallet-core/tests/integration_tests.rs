//! Ledger behaviour through the service against a real DuckDB store

use std::sync::Arc;

use uuid::Uuid;

use wallet_core::adapters::duckdb::DuckDbWalletStore;
use wallet_core::config::Config;
use wallet_core::{Operation, WalletContext, WalletError, WalletService};

fn test_service() -> WalletService {
    let store = DuckDbWalletStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    WalletService::new(Arc::new(store))
}

#[tokio::test]
async fn test_deposit_then_withdraw_everything() {
    let service = test_service();
    let wallet = service.create_wallet(0).await.unwrap();

    service.deposit(wallet.id, 1000).await.unwrap();
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 1000);

    service.withdraw(wallet.id, 1000).await.unwrap();
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 0);

    assert_eq!(
        service.withdraw(wallet.id, 1000).await,
        Err(WalletError::InsufficientBalance)
    );
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 0);
}

#[tokio::test]
async fn test_withdraw_boundary() {
    let service = test_service();
    let wallet = service.create_wallet(500).await.unwrap();

    assert_eq!(
        service.withdraw(wallet.id, 501).await,
        Err(WalletError::InsufficientBalance)
    );
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 500);

    service.withdraw(wallet.id, 500).await.unwrap();
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 0);
}

#[tokio::test]
async fn test_create_wallet_balances() {
    let service = test_service();

    let empty = service.create_wallet(0).await.unwrap();
    assert_eq!(empty.balance, 0);
    assert_eq!(service.get_wallet(empty.id).await.unwrap(), empty);

    assert_eq!(service.create_wallet(-1).await, Err(WalletError::NegativeBalance));
    assert_eq!(service.get_wallets().await.unwrap(), vec![empty]);
}

#[tokio::test]
async fn test_zero_amounts_are_accepted() {
    let service = test_service();
    let wallet = service.create_wallet(0).await.unwrap();

    service.apply(Operation::Deposit, wallet.id, 0).await.unwrap();
    service.apply(Operation::Withdraw, wallet.id, 0).await.unwrap();
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 0);
}

#[tokio::test]
async fn test_unknown_wallet_is_invalid_id() {
    let service = test_service();
    let id = Uuid::new_v4();

    assert_eq!(service.get_wallet(id).await, Err(WalletError::InvalidId));
    assert_eq!(service.deposit(id, 10).await, Err(WalletError::InvalidId));
    assert_eq!(service.withdraw(id, 10).await, Err(WalletError::InvalidId));
}

#[tokio::test]
async fn test_negative_amount_leaves_balance_untouched() {
    let service = test_service();
    let wallet = service.create_wallet(100).await.unwrap();

    assert_eq!(service.deposit(wallet.id, -50).await, Err(WalletError::InvalidAmount));
    assert_eq!(service.withdraw(wallet.id, -50).await, Err(WalletError::InvalidAmount));
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, 100);
}

#[tokio::test]
async fn test_deposit_overflow_is_rejected() {
    let service = test_service();
    let wallet = service.create_wallet(i64::MAX - 1).await.unwrap();

    service.deposit(wallet.id, 1).await.unwrap();
    assert_eq!(service.deposit(wallet.id, 1).await, Err(WalletError::InvalidAmount));
    assert_eq!(service.get_wallet(wallet.id).await.unwrap().balance, i64::MAX);
}

#[tokio::test]
async fn test_reads_do_not_change_state() {
    let service = test_service();
    let wallet = service.create_wallet(42).await.unwrap();

    let first = service.get_wallet(wallet.id).await.unwrap();
    let second = service.get_wallet(wallet.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(service.get_wallets().await.unwrap(), vec![first]);
}

#[tokio::test]
async fn test_context_wires_service_to_storage() {
    let ctx = WalletContext::new(Config::in_memory()).await.unwrap();

    let a = ctx.wallet_service.create_wallet(10).await.unwrap();
    let b = ctx.wallet_service.create_wallet(20).await.unwrap();
    assert_ne!(a.id, b.id);

    let mut balances: Vec<i64> = ctx
        .wallet_service
        .get_wallets()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.balance)
        .collect();
    balances.sort();
    assert_eq!(balances, vec![10, 20]);
}
