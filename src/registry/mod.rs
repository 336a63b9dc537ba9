//! Registry: lookup and persistence of customers and their accounts.
//!
//! The registry stores whole customer aggregates. Balances are the one
//! exception: they only change through [`Registry::deposit`],
//! [`Registry::withdraw`] and [`Registry::transfer`], each of which runs the
//! ledger's check-then-mutate step while holding exclusive access to the
//! accounts it touches. Saving a customer never overwrites the stored balance
//! of an existing account.
//!
//! Customer saves are versioned: a save built from a copy that another save
//! has since replaced fails with [`AppError::Conflict`], and a save of a
//! customer that has been deleted fails with [`AppError::CustomerNotFound`].
//! Read-modify-write of one customer goes through
//! [`Registry::update_customer`], which holds the customer exclusively from
//! load to save.
//!
//! Two backends exist:
//! - [`MemoryRegistry`]: process memory, used for development and tests
//! - [`PgRegistry`]: PostgreSQL through sqlx

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    ledger::Amount,
    models::{account::Account, customer::Customer},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRegistry;
pub use postgres::PgRegistry;

/// An in-place change to a customer aggregate, run by
/// [`Registry::update_customer`] while the customer is held exclusively.
pub type CustomerEdit<'a> = Box<dyn FnOnce(&mut Customer) -> Result<(), AppError> + Send + 'a>;

#[async_trait]
pub trait Registry: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), AppError>;

    /// Unknown ids are not an error: they yield `None`.
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError>;

    /// All customers, oldest first.
    async fn list_customers(&self) -> Result<Vec<Customer>, AppError>;

    /// Insert or update a customer aggregate.
    ///
    /// Accounts and recipients no longer present in the aggregate are deleted.
    /// A customer with `version == 0` is inserted; any other version must
    /// match the stored one. The returned aggregate carries the new version.
    async fn save_customer(&self, customer: Customer) -> Result<Customer, AppError>;

    /// Load a customer, apply `edit` and save the result as one atomic step.
    ///
    /// Fails with [`AppError::CustomerNotFound`] if the id does not exist.
    /// If `edit` returns an error nothing is saved.
    async fn update_customer<'a>(
        &self,
        id: Uuid,
        edit: CustomerEdit<'a>,
    ) -> Result<Customer, AppError>;

    /// Delete a customer together with every account and recipient it owns.
    ///
    /// Fails with [`AppError::InvalidArgument`] if the id does not exist.
    async fn delete_customer(&self, id: Uuid) -> Result<(), AppError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn deposit(&self, account_id: Uuid, amount: Amount) -> Result<Account, AppError>;

    async fn withdraw(&self, account_id: Uuid, amount: Amount) -> Result<Account, AppError>;

    /// Returns `(source, destination)` after the move.
    async fn transfer(
        &self,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Amount,
    ) -> Result<(Account, Account), AppError>;
}

/// Children must carry the id of the customer that holds them.
fn check_ownership(customer: &Customer) -> Result<(), AppError> {
    if let Some(account) = customer
        .accounts
        .iter()
        .find(|a| a.customer_id != customer.id)
    {
        return Err(AppError::InvalidArgument(format!(
            "account {} belongs to customer {}",
            account.id, account.customer_id
        )));
    }

    if let Some(recipient) = customer
        .recipients
        .iter()
        .find(|r| r.customer_id != customer.id)
    {
        return Err(AppError::InvalidArgument(format!(
            "recipient {} belongs to customer {}",
            recipient.id, recipient.customer_id
        )));
    }

    Ok(())
}
