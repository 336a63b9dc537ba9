//! Customer service - profile management and ownership of accounts and recipients.
//!
//! Every operation that takes user input validates it first and only then
//! changes the customer aggregate through [`Registry::update_customer`], so
//! overlapping requests on one customer never overwrite each other. Removing
//! an account or a recipient is done by unlinking it from its customer; the
//! registry deletes it when the customer is saved.

use uuid::Uuid;

use crate::{
    config::AccountDefaults,
    error::AppError,
    models::{
        account::{Account, AccountKind, AccountKindName, OpenAccountRequest},
        customer::{Customer, CustomerProfile},
        recipient::{NewRecipient, Recipient},
    },
    registry::Registry,
    validation::{validate_profile, validate_recipient},
};

pub async fn list_customers(registry: &dyn Registry) -> Result<Vec<Customer>, AppError> {
    registry.list_customers().await
}

pub async fn get_customer(registry: &dyn Registry, customer_id: Uuid) -> Result<Customer, AppError> {
    registry
        .find_customer(customer_id)
        .await?
        .ok_or(AppError::CustomerNotFound)
}

pub async fn add_customer(
    registry: &dyn Registry,
    profile: CustomerProfile,
) -> Result<Customer, AppError> {
    AppError::check(validate_profile(&profile))?;

    let customer = registry.save_customer(Customer::new(profile)).await?;
    tracing::info!(customer_id = %customer.id, "customer added");

    Ok(customer)
}

pub async fn update_customer(
    registry: &dyn Registry,
    customer_id: Uuid,
    profile: CustomerProfile,
) -> Result<Customer, AppError> {
    AppError::check(validate_profile(&profile))?;

    let customer = registry
        .update_customer(
            customer_id,
            Box::new(move |customer: &mut Customer| {
                customer.apply_profile(profile);
                Ok(())
            }),
        )
        .await?;
    tracing::info!(%customer_id, "customer updated");

    Ok(customer)
}

/// Delete a customer and, with it, all of its accounts and recipients.
pub async fn delete_customer(registry: &dyn Registry, customer_id: Uuid) -> Result<(), AppError> {
    registry.delete_customer(customer_id).await?;
    tracing::info!(%customer_id, "customer deleted");
    Ok(())
}

/// Resolve the requested kind against the configured defaults.
fn account_kind(
    request: &OpenAccountRequest,
    defaults: AccountDefaults,
) -> Result<AccountKind, AppError> {
    let kind = match request.kind {
        AccountKindName::Checking => AccountKind::Checking {
            overdraft_limit_cents: request
                .overdraft_limit_cents
                .unwrap_or(defaults.overdraft_limit_cents),
        },
        AccountKindName::Savings => AccountKind::Savings {
            minimum_balance_cents: request
                .minimum_balance_cents
                .unwrap_or(defaults.savings_minimum_balance_cents),
        },
    };

    let policy = match kind {
        AccountKind::Checking {
            overdraft_limit_cents,
        } => overdraft_limit_cents,
        AccountKind::Savings {
            minimum_balance_cents,
        } => minimum_balance_cents,
    };
    if policy < 0 {
        return Err(AppError::InvalidRequest(
            "Account policy limits must not be negative".to_string(),
        ));
    }

    Ok(kind)
}

/// Open a new zero-balance account for a customer.
pub async fn open_account(
    registry: &dyn Registry,
    defaults: AccountDefaults,
    customer_id: Uuid,
    request: OpenAccountRequest,
) -> Result<Account, AppError> {
    let kind = account_kind(&request, defaults)?;

    let mut opened = None;
    let customer = registry
        .update_customer(
            customer_id,
            Box::new(|customer: &mut Customer| {
                opened = Some(customer.open_account(kind).id);
                Ok(())
            }),
        )
        .await?;

    let account = opened
        .and_then(|id| customer.account(id))
        .cloned()
        .ok_or(AppError::AccountNotFound)?;

    tracing::info!(%customer_id, account_id = %account.id, kind = kind.as_str(), "account opened");
    Ok(account)
}

/// Unlink an account from its customer, which deletes it.
pub async fn close_account(
    registry: &dyn Registry,
    customer_id: Uuid,
    account_id: Uuid,
) -> Result<(), AppError> {
    registry
        .update_customer(
            customer_id,
            Box::new(move |customer: &mut Customer| {
                customer
                    .remove_account(account_id)
                    .map(drop)
                    .ok_or(AppError::AccountNotFound)
            }),
        )
        .await?;
    tracing::info!(%customer_id, %account_id, "account closed");

    Ok(())
}

pub async fn list_recipients(
    registry: &dyn Registry,
    customer_id: Uuid,
) -> Result<Vec<Recipient>, AppError> {
    Ok(get_customer(registry, customer_id).await?.recipients)
}

pub async fn add_recipient(
    registry: &dyn Registry,
    customer_id: Uuid,
    recipient: NewRecipient,
) -> Result<Recipient, AppError> {
    AppError::check(validate_recipient(&recipient))?;

    let mut added = None;
    let customer = registry
        .update_customer(
            customer_id,
            Box::new(|customer: &mut Customer| {
                added = Some(customer.add_recipient(recipient).id);
                Ok(())
            }),
        )
        .await?;

    customer
        .recipients
        .into_iter()
        .find(|r| Some(r.id) == added)
        .ok_or(AppError::RecipientNotFound)
}

pub async fn remove_recipient(
    registry: &dyn Registry,
    customer_id: Uuid,
    recipient_id: Uuid,
) -> Result<(), AppError> {
    registry
        .update_customer(
            customer_id,
            Box::new(move |customer: &mut Customer| {
                customer
                    .remove_recipient(recipient_id)
                    .map(drop)
                    .ok_or(AppError::RecipientNotFound)
            }),
        )
        .await?;
    tracing::info!(%customer_id, %recipient_id, "recipient removed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            first_name: "Sergio".to_string(),
            last_name: "Gouveia".to_string(),
            email: Some("mail@gmail.com".to_string()),
            phone: Some("777888999".to_string()),
        }
    }

    fn open(kind: AccountKindName) -> OpenAccountRequest {
        OpenAccountRequest {
            kind,
            overdraft_limit_cents: None,
            minimum_balance_cents: None,
        }
    }

    #[tokio::test]
    async fn invalid_profile_is_rejected_before_saving() {
        let registry = MemoryRegistry::new();
        let profile = CustomerProfile {
            first_name: String::new(),
            ..profile()
        };

        let err = add_customer(&registry, profile).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(ref v) if v[0].field == "first_name"));
        assert!(registry.list_customers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_update_keeps_previous_profile() {
        let registry = MemoryRegistry::new();
        let customer = add_customer(&registry, profile()).await.unwrap();

        let bad = CustomerProfile {
            email: Some("nope".to_string()),
            ..profile()
        };
        assert!(update_customer(&registry, customer.id, bad).await.is_err());

        let stored = get_customer(&registry, customer.id).await.unwrap();
        assert_eq!(stored.email.as_deref(), Some("mail@gmail.com"));
    }

    #[tokio::test]
    async fn opened_accounts_use_configured_defaults() {
        let registry = MemoryRegistry::new();
        let customer = add_customer(&registry, profile()).await.unwrap();
        let defaults = AccountDefaults {
            overdraft_limit_cents: 2_500,
            savings_minimum_balance_cents: 10_000,
        };

        let checking = open_account(&registry, defaults, customer.id, open(AccountKindName::Checking))
            .await
            .unwrap();
        let savings = open_account(&registry, defaults, customer.id, open(AccountKindName::Savings))
            .await
            .unwrap();

        assert_eq!(
            checking.kind,
            AccountKind::Checking {
                overdraft_limit_cents: 2_500
            }
        );
        assert_eq!(
            savings.kind,
            AccountKind::Savings {
                minimum_balance_cents: 10_000
            }
        );
        assert_eq!(get_customer(&registry, customer.id).await.unwrap().accounts.len(), 2);
    }

    #[tokio::test]
    async fn negative_policy_is_invalid() {
        let registry = MemoryRegistry::new();
        let customer = add_customer(&registry, profile()).await.unwrap();
        let request = OpenAccountRequest {
            overdraft_limit_cents: Some(-1),
            ..open(AccountKindName::Checking)
        };

        let err = open_account(&registry, AccountDefaults::default(), customer.id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn closing_an_account_deletes_it() {
        let registry = MemoryRegistry::new();
        let customer = add_customer(&registry, profile()).await.unwrap();
        let account = open_account(
            &registry,
            AccountDefaults::default(),
            customer.id,
            open(AccountKindName::Checking),
        )
        .await
        .unwrap();

        close_account(&registry, customer.id, account.id).await.unwrap();

        assert!(registry.find_account(account.id).await.unwrap().is_none());
        let err = close_account(&registry, customer.id, account.id).await.unwrap_err();
        assert!(matches!(err, AppError::AccountNotFound));
    }

    #[tokio::test]
    async fn recipients_can_be_added_and_removed() {
        let registry = MemoryRegistry::new();
        let customer = add_customer(&registry, profile()).await.unwrap();

        let recipient = add_recipient(
            &registry,
            customer.id,
            NewRecipient {
                name: "Landlord".to_string(),
                account_number: "000123456789".to_string(),
                ..NewRecipient::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(list_recipients(&registry, customer.id).await.unwrap().len(), 1);

        remove_recipient(&registry, customer.id, recipient.id).await.unwrap();
        assert!(list_recipients(&registry, customer.id).await.unwrap().is_empty());

        let err = remove_recipient(&registry, customer.id, recipient.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RecipientNotFound));
    }

    #[tokio::test]
    async fn deleting_a_customer_with_accounts_removes_them_all() {
        let registry = MemoryRegistry::new();
        let customer = add_customer(&registry, profile()).await.unwrap();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let account = open_account(
                &registry,
                AccountDefaults::default(),
                customer.id,
                open(AccountKindName::Savings),
            )
            .await
            .unwrap();
            ids.push(account.id);
        }

        delete_customer(&registry, customer.id).await.unwrap();

        for id in ids {
            assert!(registry.find_account(id).await.unwrap().is_none());
        }
        let err = delete_customer(&registry, customer.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
