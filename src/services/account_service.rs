//! Account service - deposits, withdrawals and transfers.
//!
//! This service handles:
//! - Amount validation
//! - Delegating the admission-checked mutation to the registry
//! - Logging completed and declined operations
//!
//! A declined operation is reported as [`AppError::Declined`] with the
//! ledger's reason. The balances involved are guaranteed to be unchanged.

use uuid::Uuid;

use crate::{error::AppError, ledger::Amount, models::account::Account, registry::Registry};

/// Parse a client-supplied amount. Zero and negative amounts are rejected.
fn positive_amount(amount_cents: i64) -> Result<Amount, AppError> {
    Amount::from_cents(amount_cents)
        .filter(|amount| *amount > Amount::ZERO)
        .ok_or_else(|| AppError::InvalidRequest("Amount must be positive".to_string()))
}

fn log_decline(operation: &'static str, account_id: Uuid, err: &AppError) {
    if let AppError::Declined(reason) = err {
        tracing::warn!(operation, %account_id, reason = reason.code(), "operation declined");
    }
}

pub async fn get_account(registry: &dyn Registry, account_id: Uuid) -> Result<Account, AppError> {
    registry
        .find_account(account_id)
        .await?
        .ok_or(AppError::AccountNotFound)
}

/// Credit an account.
///
/// # Errors
///
/// - `InvalidRequest`: Amount is zero or negative
/// - `AccountNotFound`: Account doesn't exist
/// - `Declined`: The balance would overflow
pub async fn deposit(
    registry: &dyn Registry,
    account_id: Uuid,
    amount_cents: i64,
) -> Result<Account, AppError> {
    let amount = positive_amount(amount_cents)?;

    let account = registry
        .deposit(account_id, amount)
        .await
        .inspect_err(|err| log_decline("deposit", account_id, err))?;

    tracing::info!(%account_id, amount_cents, balance_cents = account.balance_cents, "deposit completed");
    Ok(account)
}

/// Withdraw from an account.
///
/// Both the account-level `can_withdraw` check and the amount-level
/// `can_debit` check must pass.
pub async fn withdraw(
    registry: &dyn Registry,
    account_id: Uuid,
    amount_cents: i64,
) -> Result<Account, AppError> {
    let amount = positive_amount(amount_cents)?;

    let account = registry
        .withdraw(account_id, amount)
        .await
        .inspect_err(|err| log_decline("withdraw", account_id, err))?;

    tracing::info!(%account_id, amount_cents, balance_cents = account.balance_cents, "withdrawal completed");
    Ok(account)
}

/// Transfer money between two distinct accounts.
///
/// Returns `(source, destination)` after the move.
pub async fn transfer(
    registry: &dyn Registry,
    from_account_id: Uuid,
    to_account_id: Uuid,
    amount_cents: i64,
) -> Result<(Account, Account), AppError> {
    let amount = positive_amount(amount_cents)?;

    if from_account_id == to_account_id {
        return Err(AppError::InvalidRequest(
            "Cannot transfer to same account".to_string(),
        ));
    }

    let (from, to) = registry
        .transfer(from_account_id, to_account_id, amount)
        .await
        .inspect_err(|err| log_decline("transfer", from_account_id, err))?;

    tracing::info!(%from_account_id, %to_account_id, amount_cents, "transfer completed");
    Ok((from, to))
}
