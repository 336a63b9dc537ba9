//! Customer aggregate and API request/response types.
//!
//! A `Customer` exclusively owns its accounts and recipients. Children are
//! created through the owner, carry the owner's id, and are deleted by
//! removing them from the owner and saving it again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{Account, AccountKind, AccountResponse};
use super::recipient::{NewRecipient, Recipient};

/// Editable profile fields of a customer.
///
/// Used as the request body for both creating and editing a customer.
///
/// # JSON Example
///
/// ```json
/// {
///   "first_name": "Sergio",
///   "last_name": "Gouveia",
///   "email": "mail@gmail.com",
///   "phone": "+351777888999"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,
}

/// The customer aggregate root.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub accounts: Vec<Account>,
    pub recipients: Vec<Recipient>,
    /// Number of times this aggregate has been saved; 0 until the first save.
    ///
    /// A save is accepted only if it carries the version currently stored.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a customer with no accounts and no recipients.
    pub fn new(profile: CustomerProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: non_blank(profile.email),
            phone: profile.phone,
            accounts: Vec::new(),
            recipients: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the profile fields, keeping accounts and recipients.
    pub fn apply_profile(&mut self, profile: CustomerProfile) {
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.email = non_blank(profile.email);
        self.phone = profile.phone;
        self.updated_at = Utc::now();
    }

    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    /// Open a new zero-balance account owned by this customer.
    pub fn open_account(&mut self, kind: AccountKind) -> &Account {
        self.accounts.push(Account::new(self.id, kind));
        self.updated_at = Utc::now();
        &self.accounts[self.accounts.len() - 1]
    }

    /// Unlink an account. It is deleted when the customer is next saved.
    pub fn remove_account(&mut self, account_id: Uuid) -> Option<Account> {
        let index = self.accounts.iter().position(|a| a.id == account_id)?;
        self.updated_at = Utc::now();
        Some(self.accounts.remove(index))
    }

    pub fn account(&self, account_id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == account_id)
    }

    pub fn account_mut(&mut self, account_id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == account_id)
    }

    pub fn add_recipient(&mut self, recipient: NewRecipient) -> &Recipient {
        self.recipients.push(Recipient::new(self.id, recipient));
        self.updated_at = Utc::now();
        &self.recipients[self.recipients.len() - 1]
    }

    /// Unlink a recipient. It is deleted when the customer is next saved.
    pub fn remove_recipient(&mut self, recipient_id: Uuid) -> Option<Recipient> {
        let index = self.recipients.iter().position(|r| r.id == recipient_id)?;
        self.updated_at = Utc::now();
        Some(self.recipients.remove(index))
    }
}

/// Blank optional text is stored as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Row shape of the `customers` table (children are loaded separately).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerRow {
    pub fn into_customer(self, accounts: Vec<Account>, recipients: Vec<Recipient>) -> Customer {
        Customer {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            accounts,
            recipients,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Response body for customer endpoints.
///
/// Accounts are embedded; recipients have their own endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub accounts: Vec<AccountResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
            accounts: customer.accounts.into_iter().map(Into::into).collect(),
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}
