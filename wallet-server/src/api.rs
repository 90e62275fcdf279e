//! # HTTP API
//!
//! Builds the axum router for the wallet ledger. Error bodies are short
//! plain-text messages.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Liveness probe                       |
//! | POST   | `/api/v1/wallets`      | Create a wallet `{balance}`          |
//! | GET    | `/api/v1/wallets`      | All wallets as JSON                  |
//! | GET    | `/api/v1/wallets/:id`  | Balance of one wallet as plain text  |
//! | POST   | `/api/v1/wallet`       | Deposit or withdraw                  |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use wallet_core::{Operation, Wallet, WalletError, WalletService};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub wallets: Arc<WalletService>,
    /// Reported by the health endpoint
    pub version: String,
}

pub fn create_router(state: AppState) -> Router {
    let wallets = Router::new()
        .route("/wallets", post(create_wallet_handler).get(list_wallets_handler))
        .route("/wallets/:id", get(wallet_balance_handler))
        .route("/wallet", post(update_wallet_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", wallets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A request that failed, either at validation or in the ledger
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Wallet(WalletError),
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        ApiError::Wallet(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::BadRequest("invalid body".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Wallet(WalletError::InvalidId) => (
                StatusCode::NOT_FOUND,
                "wallet with this id is not found".to_string(),
            ),
            ApiError::Wallet(
                err @ (WalletError::InsufficientBalance
                | WalletError::InvalidAmount
                | WalletError::NegativeBalance),
            ) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Wallet(WalletError::Unclassified(err)) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed".to_string())
            }
        };
        (status, message).into_response()
    }
}

fn parse_wallet_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("invalid wallet id".to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "version": state.version }))
}

#[derive(Debug, Deserialize)]
struct CreateWalletRequest {
    balance: i64,
}

async fn create_wallet_handler(
    State(state): State<AppState>,
    body: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<Json<Wallet>, ApiError> {
    let Json(req) = body?;
    if req.balance < 0 {
        return Err(WalletError::NegativeBalance.into());
    }
    let wallet = state.wallets.create_wallet(req.balance).await?;
    Ok(Json(wallet))
}

async fn list_wallets_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Wallet>>, ApiError> {
    Ok(Json(state.wallets.get_wallets().await?))
}

async fn wallet_balance_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let id = parse_wallet_id(&id)?;
    let wallet = state.wallets.get_wallet(id).await?;
    Ok(wallet.balance.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationRequest {
    wallet_id: String,
    operation_type: String,
    amount: i64,
}

async fn update_wallet_handler(
    State(state): State<AppState>,
    body: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = body?;

    let id = parse_wallet_id(&req.wallet_id)?;
    let operation: Operation = req
        .operation_type
        .parse()
        .map_err(ApiError::BadRequest)?;
    if req.amount < 0 {
        return Err(WalletError::InvalidAmount.into());
    }

    state.wallets.apply(operation, id, req.amount).await?;
    Ok(StatusCode::OK)
}
