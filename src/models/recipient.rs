//! Recipient models: named external transfer targets of a customer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::customer::non_blank;

/// A transfer target saved by a customer.
///
/// Linked to exactly one customer and deleted together with it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Recipient {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub name: String,

    /// Account number at the receiving bank
    pub account_number: String,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Recipient {
    pub(crate) fn new(customer_id: Uuid, new: NewRecipient) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            name: new.name,
            account_number: new.account_number,
            email: non_blank(new.email),
            phone: new.phone,
            description: new.description,
            created_at: Utc::now(),
        }
    }
}

/// Request body for adding a recipient.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Landlord",
///   "account_number": "000123456789",
///   "description": "Monthly rent"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRecipient {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub account_number: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub id: Uuid,
    pub name: String,
    pub account_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Recipient> for RecipientResponse {
    fn from(recipient: Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name,
            account_number: recipient.account_number,
            email: recipient.email,
            phone: recipient.phone,
            description: recipient.description,
            created_at: recipient.created_at,
        }
    }
}
