//! Account HTTP handlers.
//!
//! This module implements the money-movement endpoints:
//! - GET /api/v1/accounts/{id} - Get account by ID
//! - POST /api/v1/accounts/{id}/deposit - Add money to an account
//! - POST /api/v1/accounts/{id}/withdraw - Take money out of an account
//! - POST /api/v1/transfers - Move money between two accounts
//!
//! Declined operations answer 422 with the decline reason as error code,
//! e.g. `insufficient_funds` or `below_minimum_balance`.

use crate::{
    error::AppError,
    models::account::{AccountResponse, AmountRequest, TransferRequest, TransferResponse},
    services::account_service,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (404)**: Account not found
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = account_service::get_account(state.registry.as_ref(), account_id).await?;
    Ok(Json(account.into()))
}

/// Deposit into an account.
///
/// # Request Body
///
/// ```json
/// { "amount_cents": 100000 }
/// ```
pub async fn deposit(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account =
        account_service::deposit(state.registry.as_ref(), account_id, request.amount_cents)
            .await?;
    Ok(Json(account.into()))
}

/// Withdraw from an account.
///
/// # Validation
///
/// - The account must allow withdrawals at all (savings at or below their
///   minimum balance do not)
/// - The resulting balance must respect the account's policy
pub async fn withdraw(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account =
        account_service::withdraw(state.registry.as_ref(), account_id, request.amount_cents)
            .await?;
    Ok(Json(account.into()))
}

/// Transfer money between accounts.
///
/// # Atomicity
///
/// Either both accounts are updated or neither is.
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let (from, to) = account_service::transfer(
        state.registry.as_ref(),
        request.from_account_id,
        request.to_account_id,
        request.amount_cents,
    )
    .await?;

    Ok(Json(TransferResponse {
        from: from.into(),
        to: to.into(),
        amount_cents: request.amount_cents,
    }))
}
