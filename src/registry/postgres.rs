//! PostgreSQL registry.
//!
//! # Atomicity Guarantees
//!
//! Aggregate saves and every balance change run inside one PostgreSQL
//! transaction. Balance changes lock the touched rows with `FOR UPDATE`
//! before the ledger check, so concurrent transfers on the same account
//! serialize instead of losing updates. Transfers lock both rows in id
//! order to avoid deadlocks between opposite transfers.
//!
//! Customer edits lock the customer row with `FOR UPDATE` for the whole
//! load, edit and save. Plain saves are versioned: the `UPDATE` only matches
//! the row if the stored `version` is the one the caller loaded.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use super::{CustomerEdit, Registry, check_ownership};
use crate::{
    db::DbPool,
    error::AppError,
    ledger::{self, Amount, DeclineReason},
    models::{
        account::{Account, AccountKind, AccountRow},
        customer::{Customer, CustomerRow},
        recipient::Recipient,
    },
};

const ACCOUNT_COLUMNS: &str = "id, customer_id, kind, balance_cents, overdraft_limit_cents, \
     minimum_balance_cents, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: DbPool,
}

impl PgRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Lock one account row and apply `op` to it.
    async fn mutate<F>(&self, account_id: Uuid, op: F) -> Result<Account, AppError>
    where
        F: FnOnce(&mut Account) -> Result<(), DeclineReason> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let mut account = lock_accounts(&mut tx, &[account_id])
            .await?
            .pop()
            .ok_or(AppError::AccountNotFound)?;

        if let Err(reason) = op(&mut account) {
            tx.rollback().await?;
            return Err(reason.into());
        }

        store_balance(&mut tx, &account).await?;
        tx.commit().await?;

        Ok(account)
    }
}

fn into_accounts(rows: Vec<AccountRow>) -> Result<Vec<Account>, AppError> {
    rows.into_iter()
        .map(|row| Account::try_from(row).map_err(AppError::CorruptRecord))
        .collect()
}

/// Policy columns `(overdraft_limit_cents, minimum_balance_cents)`.
fn policy_columns(kind: &AccountKind) -> (Option<i64>, Option<i64>) {
    match *kind {
        AccountKind::Checking {
            overdraft_limit_cents,
        } => (Some(overdraft_limit_cents), None),
        AccountKind::Savings {
            minimum_balance_cents,
        } => (None, Some(minimum_balance_cents)),
    }
}

/// Load a customer with its children on one connection.
///
/// With `lock` the customer row stays locked until the surrounding
/// transaction ends.
async fn load_customer(
    conn: &mut PgConnection,
    id: Uuid,
    lock: bool,
) -> Result<Option<Customer>, AppError> {
    let sql = if lock {
        "SELECT * FROM customers WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT * FROM customers WHERE id = $1"
    };
    let Some(row) = sqlx::query_as::<_, CustomerRow>(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE customer_id = $1 ORDER BY created_at, id"
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let recipients = sqlx::query_as::<_, Recipient>(
        "SELECT * FROM recipients WHERE customer_id = $1 ORDER BY created_at, id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(row.into_customer(into_accounts(rows)?, recipients)))
}

/// Write the customer row and reconcile its children.
///
/// Must run inside a transaction; on error the caller drops it, which rolls
/// everything back.
async fn write_aggregate(conn: &mut PgConnection, customer: &Customer) -> Result<(), AppError> {
    if customer.version == 0 {
        let inserted = sqlx::query(
            r#"
            INSERT INTO customers (id, first_name, last_name, email, phone, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 1, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(AppError::Conflict(format!(
                "customer {} already exists",
                customer.id
            )));
        }
    } else {
        let updated = sqlx::query(
            r#"
            UPDATE customers
            SET first_name = $2, last_name = $3, email = $4, phone = $5,
                updated_at = $6, version = version + 1
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.updated_at)
        .bind(customer.version)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                    .bind(customer.id)
                    .fetch_one(&mut *conn)
                    .await?;

            return Err(if exists {
                AppError::Conflict(format!(
                    "customer {} was changed since version {}",
                    customer.id, customer.version
                ))
            } else {
                AppError::CustomerNotFound
            });
        }
    }

    // Orphan removal
    let account_ids: Vec<Uuid> = customer.accounts.iter().map(|a| a.id).collect();
    sqlx::query("DELETE FROM accounts WHERE customer_id = $1 AND NOT (id = ANY($2))")
        .bind(customer.id)
        .bind(&account_ids)
        .execute(&mut *conn)
        .await?;

    let recipient_ids: Vec<Uuid> = customer.recipients.iter().map(|r| r.id).collect();
    sqlx::query("DELETE FROM recipients WHERE customer_id = $1 AND NOT (id = ANY($2))")
        .bind(customer.id)
        .bind(&recipient_ids)
        .execute(&mut *conn)
        .await?;

    // Existing accounts keep their stored balance and owner.
    for account in &customer.accounts {
        let (overdraft, minimum) = policy_columns(&account.kind);
        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (
                id, customer_id, kind, balance_cents,
                overdraft_limit_cents, minimum_balance_cents, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(account.id)
        .bind(customer.id)
        .bind(account.kind.as_str())
        .bind(account.balance_cents)
        .bind(overdraft)
        .bind(minimum)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            let owner: Uuid = sqlx::query_scalar("SELECT customer_id FROM accounts WHERE id = $1")
                .bind(account.id)
                .fetch_one(&mut *conn)
                .await?;

            if owner != customer.id {
                return Err(AppError::InvalidArgument(format!(
                    "account {} belongs to customer {}",
                    account.id, owner
                )));
            }
        }
    }

    for recipient in &customer.recipients {
        let written = sqlx::query(
            r#"
            INSERT INTO recipients (
                id, customer_id, name, account_number, email, phone, description, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                account_number = EXCLUDED.account_number,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                description = EXCLUDED.description
            WHERE recipients.customer_id = EXCLUDED.customer_id
            "#,
        )
        .bind(recipient.id)
        .bind(customer.id)
        .bind(&recipient.name)
        .bind(&recipient.account_number)
        .bind(&recipient.email)
        .bind(&recipient.phone)
        .bind(&recipient.description)
        .bind(recipient.created_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        // The conflict branch skips rows of other customers.
        if written == 0 {
            let owner: Uuid =
                sqlx::query_scalar("SELECT customer_id FROM recipients WHERE id = $1")
                    .bind(recipient.id)
                    .fetch_one(&mut *conn)
                    .await?;

            return Err(AppError::InvalidArgument(format!(
                "recipient {} belongs to customer {}",
                recipient.id, owner
            )));
        }
    }

    Ok(())
}

/// `SELECT … FOR UPDATE` the given accounts, ordered by id.
async fn lock_accounts(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> Result<Vec<Account>, AppError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE"
    ))
    .bind(ids)
    .fetch_all(&mut **tx)
    .await?;

    into_accounts(rows)
}

async fn store_balance(
    tx: &mut Transaction<'_, Postgres>,
    account: &Account,
) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET balance_cents = $1, updated_at = $2 WHERE id = $3")
        .bind(account.balance_cents)
        .bind(account.updated_at)
        .bind(account.id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[async_trait]
impl Registry for PgRegistry {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let mut conn = self.pool.acquire().await?;
        load_customer(&mut conn, id, false).await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let rows =
            sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        let account_rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let recipients =
            sqlx::query_as::<_, Recipient>("SELECT * FROM recipients ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        let mut accounts_by_owner: HashMap<Uuid, Vec<Account>> = HashMap::new();
        for account in into_accounts(account_rows)? {
            accounts_by_owner
                .entry(account.customer_id)
                .or_default()
                .push(account);
        }

        let mut recipients_by_owner: HashMap<Uuid, Vec<Recipient>> = HashMap::new();
        for recipient in recipients {
            recipients_by_owner
                .entry(recipient.customer_id)
                .or_default()
                .push(recipient);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let accounts = accounts_by_owner.remove(&row.id).unwrap_or_default();
                let recipients = recipients_by_owner.remove(&row.id).unwrap_or_default();
                row.into_customer(accounts, recipients)
            })
            .collect())
    }

    async fn save_customer(&self, customer: Customer) -> Result<Customer, AppError> {
        check_ownership(&customer)?;

        let mut tx = self.pool.begin().await?;
        write_aggregate(&mut tx, &customer).await?;
        tx.commit().await?;

        self.find_customer(customer.id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    async fn update_customer<'a>(
        &self,
        id: Uuid,
        edit: CustomerEdit<'a>,
    ) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut customer = load_customer(&mut tx, id, true)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        edit(&mut customer)?;
        check_ownership(&customer)?;

        write_aggregate(&mut tx, &customer).await?;
        tx.commit().await?;

        customer.version += 1;
        Ok(customer)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<(), AppError> {
        // Accounts and recipients go with it through ON DELETE CASCADE.
        let deleted = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::InvalidArgument(format!(
                "customer {id} does not exist"
            )));
        }

        Ok(())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Account::try_from(row).map_err(AppError::CorruptRecord))
            .transpose()
    }

    async fn deposit(&self, account_id: Uuid, amount: Amount) -> Result<Account, AppError> {
        self.mutate(account_id, move |account| account.credit(amount))
            .await
    }

    async fn withdraw(&self, account_id: Uuid, amount: Amount) -> Result<Account, AppError> {
        self.mutate(account_id, move |account| account.withdraw(amount))
            .await
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

        let mut tx = self.pool.begin().await?;

        let (mut src, mut dst) = (None, None);
        for account in lock_accounts(&mut tx, &[from_account_id, to_account_id]).await? {
            if account.id == from_account_id {
                src = Some(account);
            } else if account.id == to_account_id {
                dst = Some(account);
            }
        }

        let (Some(mut src), Some(mut dst)) = (src, dst) else {
            tx.rollback().await?;
            return Err(AppError::AccountNotFound);
        };

        if let Err(reason) = ledger::transfer(&mut src, &mut dst, amount) {
            tx.rollback().await?;
            return Err(reason.into());
        }

        store_balance(&mut tx, &src).await?;
        store_balance(&mut tx, &dst).await?;
        tx.commit().await?;

        Ok((src, dst))
    }
}
