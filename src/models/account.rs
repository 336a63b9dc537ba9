//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Entity representing one monetary holding of a customer
//! - `AccountKind`: Checking or savings, with the policy parameters of each
//! - Request bodies for opening accounts and moving money
//! - `AccountResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of account together with its admission policy parameters.
///
/// # JSON Example
///
/// ```json
/// { "type": "checking", "overdraft_limit_cents": 5000 }
/// { "type": "savings", "minimum_balance_cents": 10000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountKind {
    /// May go negative, down to `-overdraft_limit_cents`.
    Checking { overdraft_limit_cents: i64 },

    /// May never be debited below `minimum_balance_cents`.
    Savings { minimum_balance_cents: i64 },
}

impl AccountKind {
    /// Name stored in the `accounts.kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking { .. } => "checking",
            AccountKind::Savings { .. } => "savings",
        }
    }
}

/// Represents one account owned by exactly one customer.
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision issues.
/// A checking account with an overdraft allowance is the only case where the
/// balance may be negative.
///
/// Accounts are only created through [`Customer::open_account`](super::customer::Customer::open_account),
/// which stamps the owner's id. The owner never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Customer that owns this account
    pub customer_id: Uuid,

    /// Kind and policy parameters
    pub kind: AccountKind,

    /// Current balance in cents
    pub balance_cents: i64,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance update
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account always starts at zero.
    pub(crate) fn new(customer_id: Uuid, kind: AccountKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            kind,
            balance_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Row shape of the `accounts` table.
///
/// The kind is flattened into a text column plus one nullable column per
/// policy parameter, so it needs a fallible conversion into [`Account`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: String,
    pub balance_cents: i64,
    pub overdraft_limit_cents: Option<i64>,
    pub minimum_balance_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = String;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "checking" => AccountKind::Checking {
                overdraft_limit_cents: row.overdraft_limit_cents.unwrap_or(0),
            },
            "savings" => AccountKind::Savings {
                minimum_balance_cents: row.minimum_balance_cents.unwrap_or(0),
            },
            other => return Err(format!("unknown account kind '{other}'")),
        };

        Ok(Self {
            id: row.id,
            customer_id: row.customer_id,
            kind,
            balance_cents: row.balance_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Request body for opening a new account for a customer.
///
/// # JSON Example
///
/// ```json
/// { "kind": "savings" }
/// { "kind": "checking", "overdraft_limit_cents": 5000 }
/// ```
///
/// Policy parameters that are left out fall back to the configured defaults.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    pub kind: AccountKindName,

    #[serde(default)]
    pub overdraft_limit_cents: Option<i64>,

    #[serde(default)]
    pub minimum_balance_cents: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKindName {
    Checking,
    Savings,
}

/// Request to deposit into or withdraw from one account.
///
/// # JSON Example
///
/// ```json
/// { "amount_cents": 2500 }
/// ```
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount_cents: i64,
}

/// Request to move money between two accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "to_account_id": "660e8400-e29b-41d4-a716-446655440001",
///   "amount_cents": 25000
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// Either both balances change or neither does.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount_cents: i64,
}

/// Response body for account endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: AccountKind,
    pub balance_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            customer_id: account.customer_id,
            kind: account.kind,
            balance_cents: account.balance_cents,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Response body for a completed transfer: both accounts after the move.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub from: AccountResponse,
    pub to: AccountResponse,
    pub amount_cents: i64,
}
