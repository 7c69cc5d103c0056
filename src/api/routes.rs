//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Account, AccountStatus, DomainError, IdempotencyKey, Transfer, TransferType,
};
use crate::error::AppError;
use crate::handlers::{
    AccountHandler, CreateAccountCommand, TransferCommand, TransferHandler,
    UpdateAccountCommand,
};
use crate::repository::TransferRepository;

use super::AppState;

/// Request header carrying the caller's deduplication token
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub iban: String,
    #[serde(default)]
    pub initial_amount: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,
    pub iban: String,
    pub available_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub iban: String,
    pub status: AccountStatus,
    pub available_amount: Decimal,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            iban: account.iban,
            status: account.status,
            available_amount: account.available_amount,
            created_on: account.created_on,
            modified_on: account.modified_on,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub id: i64,
    pub account_id: i64,
    pub beneficiary_account_id: i64,
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
    pub amount: Decimal,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id,
            account_id: transfer.account_id,
            beneficiary_account_id: transfer.beneficiary_account_id,
            transfer_type: transfer.transfer_type,
            amount: transfer.amount,
            created_on: transfer.created_on,
            modified_on: transfer.modified_on,
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Account lifecycle
        .route("/accounts", get(list_accounts))
        .route("/accounts", post(create_account))
        .route("/accounts/batch", post(create_accounts))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id", put(update_account))
        .route("/accounts/:id", delete(delete_account))
        .route("/accounts/:id/freeze", put(freeze_account))
        .route("/accounts/:id/unfreeze", put(unfreeze_account))
        .route("/accounts/seed", post(seed_accounts))
        // Transfers
        .route("/transfers", post(create_transfer))
        .route("/transfers", get(list_transfers))
        .route("/transfers/:id", get(get_transfer))
        .route("/transfers/account/:account_id", get(list_transfers_by_account))
}

// =========================================================================
// Account endpoints
// =========================================================================

async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = AccountHandler::new(state.pool).list().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = AccountHandler::new(state.pool).get(id).await?;
    Ok(Json(account.into()))
}

async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let mut command = CreateAccountCommand::new(request.name, request.iban);
    command.initial_amount = request.initial_amount;

    let account = AccountHandler::new(state.pool).create(command).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn create_accounts(
    State(state): State<AppState>,
    Json(requests): Json<Vec<CreateAccountRequest>>,
) -> Result<(StatusCode, Json<Vec<AccountResponse>>), AppError> {
    let commands = requests
        .into_iter()
        .map(|r| {
            let mut command = CreateAccountCommand::new(r.name, r.iban);
            command.initial_amount = r.initial_amount;
            command
        })
        .collect();

    let accounts = AccountHandler::new(state.pool).create_batch(commands).await?;
    Ok((
        StatusCode::CREATED,
        Json(accounts.into_iter().map(Into::into).collect()),
    ))
}

async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let command = UpdateAccountCommand {
        name: request.name,
        iban: request.iban,
        available_amount: request.available_amount,
    };

    let account = AccountHandler::new(state.pool).update(id, command).await?;
    Ok(Json(account.into()))
}

async fn freeze_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = AccountHandler::new(state.pool).freeze(id).await?;
    Ok(Json(account.into()))
}

async fn unfreeze_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = AccountHandler::new(state.pool).unfreeze(id).await?;
    Ok(Json(account.into()))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    AccountHandler::new(state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Demo data; responds 404 unless ALLOW_SEED is set
async fn seed_accounts(State(state): State<AppState>) -> Result<Response, AppError> {
    if !state.allow_seed {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let accounts = AccountHandler::new(state.pool).seed().await?;
    let body: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

// =========================================================================
// Transfer endpoints
// =========================================================================

async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let key = IdempotencyKey::from_header(
        headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok()),
    );

    let mut command =
        TransferCommand::new(request.from_account_id, request.to_account_id, request.amount);
    if let Some(key) = key {
        command = command.with_idempotency_key(key);
    }

    let debit_row = TransferHandler::new(state.pool).execute(command).await?;
    Ok((StatusCode::CREATED, Json(debit_row.into())))
}

async fn list_transfers(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransferResponse>>, AppError> {
    let transfers = TransferRepository::new(state.pool).list().await?;
    Ok(Json(transfers.into_iter().map(Into::into).collect()))
}

async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TransferResponse>, AppError> {
    let transfer = TransferRepository::new(state.pool)
        .find_by_id(id)
        .await?
        .ok_or(DomainError::TransferNotFound(id))?;
    Ok(Json(transfer.into()))
}

async fn list_transfers_by_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<TransferResponse>>, AppError> {
    let transfers = TransferRepository::new(state.pool)
        .list_by_account(account_id)
        .await?;
    Ok(Json(transfers.into_iter().map(Into::into).collect()))
}
