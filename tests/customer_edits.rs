//! Overlapping edits of one customer over the in-memory backend.

use std::sync::Arc;

use bank_ledger_web_server::{
    config::AccountDefaults,
    error::AppError,
    models::{
        account::{AccountKindName, OpenAccountRequest},
        customer::CustomerProfile,
        recipient::NewRecipient,
    },
    registry::{MemoryRegistry, Registry},
    services::{account_service, customer_service},
};

fn profile(first_name: &str) -> CustomerProfile {
    CustomerProfile {
        first_name: first_name.to_string(),
        last_name: "Gouveia".to_string(),
        email: Some("mail@gmail.com".to_string()),
        phone: Some("777888999".to_string()),
    }
}

fn checking() -> OpenAccountRequest {
    OpenAccountRequest {
        kind: AccountKindName::Checking,
        overdraft_limit_cents: None,
        minimum_balance_cents: None,
    }
}

fn recipient(i: usize) -> NewRecipient {
    NewRecipient {
        name: format!("Recipient {i}"),
        account_number: format!("{:012}", i),
        ..NewRecipient::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_account_openings_and_recipients_are_all_kept() {
    let registry = Arc::new(MemoryRegistry::new());
    let customer_id = customer_service::add_customer(&*registry, profile("Sergio"))
        .await
        .unwrap()
        .id;

    let mut accounts = Vec::new();
    let mut recipients = Vec::new();
    for i in 0..25 {
        let (for_account, for_recipient) = (registry.clone(), registry.clone());
        accounts.push(tokio::spawn(async move {
            customer_service::open_account(
                &*for_account,
                AccountDefaults::default(),
                customer_id,
                checking(),
            )
            .await
        }));

        recipients.push(tokio::spawn(async move {
            customer_service::add_recipient(&*for_recipient, customer_id, recipient(i)).await
        }));
    }

    let mut account_ids = Vec::new();
    for handle in accounts {
        account_ids.push(handle.await.unwrap().unwrap().id);
    }
    let mut recipient_ids = Vec::new();
    for handle in recipients {
        recipient_ids.push(handle.await.unwrap().unwrap().id);
    }

    let stored = customer_service::get_customer(&*registry, customer_id)
        .await
        .unwrap();
    assert_eq!(stored.accounts.len(), 25);
    assert_eq!(stored.recipients.len(), 25);
    for id in account_ids {
        assert!(stored.account(id).is_some());
    }
    for id in recipient_ids {
        assert!(stored.recipients.iter().any(|r| r.id == id));
    }
}

#[tokio::test]
async fn stale_copy_cannot_delete_a_funded_account() {
    let registry = MemoryRegistry::new();
    let customer_id = customer_service::add_customer(&registry, profile("Sergio"))
        .await
        .unwrap()
        .id;
    let mut stale = registry.find_customer(customer_id).await.unwrap().unwrap();

    let account = customer_service::open_account(
        &registry,
        AccountDefaults::default(),
        customer_id,
        checking(),
    )
    .await
    .unwrap();
    account_service::deposit(&registry, account.id, 50_000)
        .await
        .unwrap();

    stale.add_recipient(recipient(1));
    let err = registry.save_customer(stale).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    let account = registry.find_account(account.id).await.unwrap().unwrap();
    assert_eq!(account.balance_cents, 50_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_during_updates_stays_deleted() {
    let registry = Arc::new(MemoryRegistry::new());
    let customer_id = customer_service::add_customer(&*registry, profile("Sergio"))
        .await
        .unwrap()
        .id;
    let account = customer_service::open_account(
        &*registry,
        AccountDefaults::default(),
        customer_id,
        checking(),
    )
    .await
    .unwrap();

    let mut updates = Vec::new();
    for i in 0..20 {
        let registry = registry.clone();
        updates.push(tokio::spawn(async move {
            customer_service::update_customer(
                &*registry,
                customer_id,
                profile(&format!("Sergio {i}")),
            )
            .await
        }));
    }
    let delete = {
        let registry = registry.clone();
        tokio::spawn(async move {
            customer_service::delete_customer(&*registry, customer_id).await
        })
    };

    delete.await.unwrap().unwrap();
    for handle in updates {
        match handle.await.unwrap() {
            Ok(_) | Err(AppError::CustomerNotFound) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(registry.find_customer(customer_id).await.unwrap().is_none());
    assert!(registry.find_account(account.id).await.unwrap().is_none());
    assert!(registry.list_customers().await.unwrap().is_empty());
}
