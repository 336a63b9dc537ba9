//! PostgreSQL registry against a live database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use bank_ledger_web_server::{
    config::AccountDefaults,
    db,
    error::AppError,
    ledger::Amount,
    models::{
        account::{AccountKind, AccountKindName, OpenAccountRequest},
        customer::{Customer, CustomerProfile},
        recipient::NewRecipient,
    },
    registry::{PgRegistry, Registry},
    services::customer_service,
};

const CHECKING: AccountKind = AccountKind::Checking {
    overdraft_limit_cents: 0,
};

async fn registry() -> PgRegistry {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgRegistry::new(db::connect(&url).await.unwrap())
}

fn customer(first_name: &str) -> Customer {
    Customer::new(CustomerProfile {
        first_name: first_name.to_string(),
        last_name: "Gouveia".to_string(),
        email: None,
        phone: None,
    })
}

fn landlord() -> NewRecipient {
    NewRecipient {
        name: "Landlord".to_string(),
        account_number: "000123456789".to_string(),
        ..NewRecipient::default()
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn unlinked_children_are_deleted_on_save() {
    let registry = registry().await;
    let mut customer = customer("Sergio");
    let kept = customer.open_account(CHECKING).id;
    let dropped = customer.open_account(CHECKING).id;
    let recipient = customer.add_recipient(landlord()).id;
    let mut customer = registry.save_customer(customer).await.unwrap();

    customer.remove_account(dropped);
    customer.remove_recipient(recipient);
    let saved = registry.save_customer(customer).await.unwrap();

    assert_eq!(saved.version, 2);
    assert!(registry.find_account(kept).await.unwrap().is_some());
    assert!(registry.find_account(dropped).await.unwrap().is_none());
    assert!(saved.recipients.is_empty());

    registry.delete_customer(saved.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn account_of_another_customer_is_rejected() {
    let registry = registry().await;
    let mut first = customer("Sergio");
    first.open_account(CHECKING);
    let first = registry.save_customer(first).await.unwrap();

    let mut second = customer("Maria");
    let mut stolen = first.accounts[0].clone();
    stolen.customer_id = second.id;
    second.accounts.push(stolen);

    let err = registry.save_customer(second.clone()).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert!(registry.find_customer(second.id).await.unwrap().is_none());
    let account = registry.find_account(first.accounts[0].id).await.unwrap().unwrap();
    assert_eq!(account.customer_id, first.id);

    registry.delete_customer(first.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn recipient_of_another_customer_is_rejected() {
    let registry = registry().await;
    let mut first = customer("Sergio");
    first.add_recipient(landlord());
    let first = registry.save_customer(first).await.unwrap();

    let mut second = customer("Maria");
    let mut stolen = first.recipients[0].clone();
    stolen.customer_id = second.id;
    stolen.name = "Someone else".to_string();
    second.recipients.push(stolen);

    let err = registry.save_customer(second.clone()).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert!(registry.find_customer(second.id).await.unwrap().is_none());
    let first = registry.find_customer(first.id).await.unwrap().unwrap();
    assert_eq!(first.recipients[0].name, "Landlord");

    registry.delete_customer(first.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn stale_save_is_rejected_and_deleted_customer_stays_deleted() {
    let registry = registry().await;
    let customer = registry.save_customer(customer("Sergio")).await.unwrap();
    let mut stale = customer.clone();

    let opened = registry
        .update_customer(
            customer.id,
            Box::new(|c: &mut Customer| {
                c.open_account(CHECKING);
                Ok(())
            }),
        )
        .await
        .unwrap();
    let account_id = opened.accounts[0].id;
    registry
        .deposit(account_id, Amount::from_cents(50_000).unwrap())
        .await
        .unwrap();

    stale.add_recipient(landlord());
    let err = registry.save_customer(stale.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let account = registry.find_account(account_id).await.unwrap().unwrap();
    assert_eq!(account.balance_cents, 50_000);

    registry.delete_customer(customer.id).await.unwrap();
    let err = registry.save_customer(opened).await.unwrap_err();
    assert!(matches!(err, AppError::CustomerNotFound));
    assert!(registry.find_customer(customer.id).await.unwrap().is_none());
    assert!(registry.find_account(account_id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_edits_keep_every_child() {
    let registry = Arc::new(registry().await);
    let customer_id = registry.save_customer(customer("Sergio")).await.unwrap().id;

    let mut handles = Vec::new();
    for i in 0..10 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let request = OpenAccountRequest {
                    kind: AccountKindName::Savings,
                    overdraft_limit_cents: None,
                    minimum_balance_cents: None,
                };
                customer_service::open_account(
                    &*registry,
                    AccountDefaults::default(),
                    customer_id,
                    request,
                )
                .await
                .map(|_| ())
            } else {
                customer_service::add_recipient(&*registry, customer_id, landlord())
                    .await
                    .map(|_| ())
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = registry.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(stored.accounts.len(), 5);
    assert_eq!(stored.recipients.len(), 5);

    registry.delete_customer(customer_id).await.unwrap();
}
