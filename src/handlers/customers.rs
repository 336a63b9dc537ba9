//! Customer HTTP handlers.
//!
//! This module implements the customer-related API endpoints:
//! - GET /api/v1/customers - List customers
//! - POST /api/v1/customers - Add a customer
//! - GET /api/v1/customers/{id} - Customer details with accounts
//! - PUT /api/v1/customers/{id} - Edit the customer profile
//! - DELETE /api/v1/customers/{id} - Delete a customer, its accounts and recipients
//! - POST /api/v1/customers/{id}/accounts - Open an account
//! - DELETE /api/v1/customers/{id}/accounts/{account_id} - Close an account
//! - GET /api/v1/customers/{id}/recipients - List recipients
//! - POST /api/v1/customers/{id}/recipients - Add a recipient
//! - DELETE /api/v1/customers/{id}/recipients/{recipient_id} - Remove a recipient

use crate::{
    error::AppError,
    models::{
        account::{AccountResponse, OpenAccountRequest},
        customer::{CustomerProfile, CustomerResponse},
        recipient::{NewRecipient, RecipientResponse},
    },
    services::customer_service,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = customer_service::list_customers(state.registry.as_ref()).await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// Add a customer.
///
/// # Request Body
///
/// ```json
/// {
///   "first_name": "Sergio",
///   "last_name": "Gouveia",
///   "email": "mail@gmail.com",
///   "phone": "777888999"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the new customer
/// - **Error (400)**: `validation_failed` with one entry per offending field
pub async fn create_customer(
    State(state): State<AppState>,
    Json(profile): Json<CustomerProfile>,
) -> Result<impl IntoResponse, AppError> {
    let customer = customer_service::add_customer(state.registry.as_ref(), profile).await?;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = customer_service::get_customer(state.registry.as_ref(), customer_id).await?;
    Ok(Json(customer.into()))
}

/// Replace the customer's profile fields. Accounts and recipients are kept.
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(profile): Json<CustomerProfile>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer =
        customer_service::update_customer(state.registry.as_ref(), customer_id, profile).await?;
    Ok(Json(customer.into()))
}

/// Delete a customer.
///
/// # Response
///
/// - **Success (204 No Content)**
/// - **Error (400)**: `invalid_argument` if the customer does not exist
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    customer_service::delete_customer(state.registry.as_ref(), customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Open an account for a customer.
///
/// # Request Body
///
/// ```json
/// { "kind": "checking", "overdraft_limit_cents": 5000 }
/// ```
pub async fn open_account(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = customer_service::open_account(
        state.registry.as_ref(),
        state.account_defaults,
        customer_id,
        request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

pub async fn close_account(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    customer_service::close_account(state.registry.as_ref(), customer_id, account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_recipients(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<RecipientResponse>>, AppError> {
    let recipients =
        customer_service::list_recipients(state.registry.as_ref(), customer_id).await?;
    Ok(Json(recipients.into_iter().map(Into::into).collect()))
}

pub async fn add_recipient(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<NewRecipient>,
) -> Result<impl IntoResponse, AppError> {
    let recipient =
        customer_service::add_recipient(state.registry.as_ref(), customer_id, request).await?;
    Ok((StatusCode::CREATED, Json(RecipientResponse::from(recipient))))
}

pub async fn remove_recipient(
    State(state): State<AppState>,
    Path((customer_id, recipient_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    customer_service::remove_recipient(state.registry.as_ref(), customer_id, recipient_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
