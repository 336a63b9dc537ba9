use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CustomerEdit, Registry, check_ownership};
use crate::{
    error::AppError,
    ledger::{self, Amount, DeclineReason},
    models::{account::Account, customer::Customer},
};

#[derive(Debug, Default)]
struct State {
    customers: HashMap<Uuid, Customer>,
    /// account id -> owning customer id
    owners: HashMap<Uuid, Uuid>,
}

impl State {
    fn account(&self, account_id: Uuid) -> Option<&Account> {
        let owner = self.owners.get(&account_id)?;
        self.customers.get(owner)?.account(account_id)
    }

    fn account_mut(&mut self, account_id: Uuid) -> Option<&mut Account> {
        let owner = *self.owners.get(&account_id)?;
        self.customers.get_mut(&owner)?.account_mut(account_id)
    }

    /// Apply `op` to one account under the write lock.
    fn mutate<F>(&mut self, account_id: Uuid, op: F) -> Result<Account, AppError>
    where
        F: FnOnce(&mut Account) -> Result<(), DeclineReason>,
    {
        let account = self
            .account_mut(account_id)
            .ok_or(AppError::AccountNotFound)?;
        op(&mut *account)?;
        Ok(account.clone())
    }

    /// Version-checked save of a whole aggregate.
    fn store(&mut self, mut customer: Customer) -> Result<Customer, AppError> {
        check_ownership(&customer)?;

        match self.customers.get(&customer.id) {
            Some(existing) if existing.version != customer.version => {
                return Err(AppError::Conflict(format!(
                    "customer {} was changed since version {}",
                    customer.id, customer.version
                )));
            }
            None if customer.version != 0 => return Err(AppError::CustomerNotFound),
            _ => {}
        }

        for account in &customer.accounts {
            if let Some(owner) = self.owners.get(&account.id) {
                if *owner != customer.id {
                    return Err(AppError::InvalidArgument(format!(
                        "account {} belongs to customer {}",
                        account.id, owner
                    )));
                }
            }
        }

        // Stored balances win over whatever the caller is holding.
        if let Some(existing) = self.customers.get(&customer.id) {
            for account in &mut customer.accounts {
                if let Some(stored) = existing.account(account.id) {
                    account.balance_cents = stored.balance_cents;
                    account.updated_at = stored.updated_at;
                }
            }
        }

        // Orphan removal: forget accounts that were unlinked.
        self.owners.retain(|account_id, owner| {
            *owner != customer.id || customer.account(*account_id).is_some()
        });
        for account in &customer.accounts {
            self.owners.insert(account.id, customer.id);
        }

        customer.version += 1;
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }
}

/// In-memory registry.
///
/// Intended for tests/dev. A single write lock serializes every mutation,
/// which gives each ledger operation exclusive access to its accounts and
/// each customer edit exclusive access to its aggregate.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: RwLock<State>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let state = self.state.read().await;
        let mut customers: Vec<Customer> = state.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(customers)
    }

    async fn save_customer(&self, customer: Customer) -> Result<Customer, AppError> {
        self.state.write().await.store(customer)
    }

    async fn update_customer<'a>(
        &self,
        id: Uuid,
        edit: CustomerEdit<'a>,
    ) -> Result<Customer, AppError> {
        let mut state = self.state.write().await;

        let mut customer = state
            .customers
            .get(&id)
            .cloned()
            .ok_or(AppError::CustomerNotFound)?;
        edit(&mut customer)?;

        state.store(customer)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        let customer = state
            .customers
            .remove(&id)
            .ok_or_else(|| AppError::InvalidArgument(format!("customer {id} does not exist")))?;

        for account in &customer.accounts {
            state.owners.remove(&account.id);
        }

        Ok(())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.state.read().await.account(id).cloned())
    }

    async fn deposit(&self, account_id: Uuid, amount: Amount) -> Result<Account, AppError> {
        let mut state = self.state.write().await;
        state.mutate(account_id, |account| account.credit(amount))
    }

    async fn withdraw(&self, account_id: Uuid, amount: Amount) -> Result<Account, AppError> {
        let mut state = self.state.write().await;
        state.mutate(account_id, |account| account.withdraw(amount))
    }

    async fn transfer(
        &self,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Amount,
    ) -> Result<(Account, Account), AppError> {
        if from_account_id == to_account_id {
            return Err(AppError::InvalidRequest(
                "Cannot transfer to same account".to_string(),
            ));
        }

        let mut state = self.state.write().await;

        let mut src = state
            .account(from_account_id)
            .cloned()
            .ok_or(AppError::AccountNotFound)?;
        let mut dst = state
            .account(to_account_id)
            .cloned()
            .ok_or(AppError::AccountNotFound)?;

        ledger::transfer(&mut src, &mut dst, amount)?;

        for account in [&src, &dst] {
            if let Some(stored) = state.account_mut(account.id) {
                *stored = account.clone();
            }
        }

        Ok((src, dst))
    }
}
