//! Serve command - run the HTTP server until a shutdown signal

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::oneshot;

use super::get_context;
use crate::api::{create_router, AppState};

pub async fn run(address: Option<String>) -> Result<()> {
    let ctx = get_context().await?;
    let address = address.unwrap_or_else(|| ctx.config.address.clone());
    let shutdown_timeout = ctx.config.shutdown_timeout;

    let state = AppState {
        wallets: Arc::new(ctx.wallet_service.clone()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(
        address = %listener.local_addr()?,
        backend = ctx.backend().name(),
        "wallet server listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, create_router(state))
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let served = tokio::select! {
        res = &mut server => Some(res),
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
            None
        }
    };

    let served = match served {
        Some(res) => res,
        None => {
            let _ = stop_tx.send(());
            match tokio::time::timeout(shutdown_timeout, &mut server).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = shutdown_timeout.as_secs(),
                        "connections still open after shutdown timeout"
                    );
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    if tokio::time::timeout(shutdown_timeout, ctx.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("storage did not close within the shutdown timeout");
    }

    served.context("server task failed")??;
    tracing::info!("wallet server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
