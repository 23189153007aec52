//! Integration tests for account opening and the ledger repository.
//!
//! Requires PostgreSQL at `DATABASE_URL`; each test skips when it is not
//! reachable.

mod common;

use bank_db::{AccountError, LedgerRepository, OpenAccount, TxContext};
use bank_shared::types::{AccountId, Currency, EntryId, PageRequest, TransferId};
use sea_orm::DbErr;

use common::{open, setup, unique_owner};

#[tokio::test]
async fn test_open_account_writes_opening_entry() {
    let Some(store) = setup().await else { return };
    let owner = unique_owner("open");

    let account = store
        .open_account(
            &TxContext::background(),
            OpenAccount::new(owner.clone(), "CAD", 1_250).unwrap(),
        )
        .await
        .expect("Failed to open account");

    assert_eq!(account.owner, owner);
    assert_eq!(account.currency, "CAD");
    assert_eq!(account.balance, 1_250);

    let entries = store
        .list_entries(account.account_id(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, 1_250);

    let audit = store
        .audit_account(&TxContext::background(), account.account_id())
        .await
        .unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.entries_sum, 1_250);
}

#[tokio::test]
async fn test_zero_opening_balance_writes_no_entry() {
    let Some(store) = setup().await else { return };
    let account = open(&store, 0).await;

    let entries = store
        .list_entries(account.account_id(), PageRequest::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_duplicate_owner_currency_rejected() {
    let Some(store) = setup().await else { return };
    let owner = unique_owner("dup");
    let ctx = TxContext::background();

    let input = OpenAccount {
        owner: owner.clone(),
        currency: Currency::Usd,
        opening_balance: 10,
    };
    store.open_account(&ctx, input.clone()).await.unwrap();

    let err = store.open_account(&ctx, input).await.unwrap_err();
    assert!(
        matches!(err, AccountError::Duplicate { owner: ref o, currency: Currency::Usd } if *o == owner),
        "unexpected error: {err}"
    );

    // same owner, other currency is fine
    store
        .open_account(
            &ctx,
            OpenAccount {
                owner: owner.clone(),
                currency: Currency::Eur,
                opening_balance: 0,
            },
        )
        .await
        .expect("a second currency should be allowed");

    let accounts = store
        .list_accounts(&owner, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts[0].id < accounts[1].id);
}

#[tokio::test]
async fn test_negative_opening_balance_rejected() {
    let Some(store) = setup().await else { return };
    let owner = unique_owner("neg");

    let err = store
        .open_account(
            &TxContext::background(),
            OpenAccount {
                owner: owner.clone(),
                currency: Currency::Usd,
                opening_balance: -1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::NegativeOpeningBalance(-1)));

    let accounts = store
        .list_accounts(&owner, PageRequest::default())
        .await
        .unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn test_get_missing_records() {
    let Some(store) = setup().await else { return };

    let err = store.get_account(AccountId::new(i64::MAX)).await.unwrap_err();
    assert!(matches!(err, AccountError::NotFound(_)));
    assert!(store.get_entry(EntryId::new(i64::MAX)).await.unwrap().is_none());
    assert!(store
        .get_transfer(TransferId::new(i64::MAX))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_list_entries_paginates_oldest_first() {
    let Some(store) = setup().await else { return };
    let account = open(&store, 0).await;
    let id = account.account_id();

    let repo = store.repository();
    for amount in 1..=5 {
        repo.create_entry(id, amount).await.unwrap();
    }

    let first = store.list_entries(id, PageRequest::new(1, 2)).await.unwrap();
    let second = store.list_entries(id, PageRequest::new(2, 2)).await.unwrap();
    let third = store.list_entries(id, PageRequest::new(3, 2)).await.unwrap();

    let amounts = |page: &[bank_db::entities::entries::Model]| {
        page.iter().map(|e| e.amount).collect::<Vec<_>>()
    };
    assert_eq!(amounts(&first), vec![1, 2]);
    assert_eq!(amounts(&second), vec![3, 4]);
    assert_eq!(amounts(&third), vec![5]);
    assert_eq!(repo.sum_entries(id).await.unwrap(), 15);
}

#[tokio::test]
async fn test_balance_primitives_inside_transaction() {
    let Some(store) = setup().await else { return };
    let account = open(&store, 0).await;
    let id = account.account_id();

    let updated = store
        .executor()
        .run_in_transaction(&TxContext::background(), move |repo| {
            Box::pin(async move {
                let locked = repo.get_account_for_update(id).await?;
                assert!(locked.is_some());
                repo.update_account_balance(id, 40).await?;
                repo.add_account_balance(id, 2).await
            })
        })
        .await
        .expect("transaction should commit")
        .expect("account should exist");
    assert_eq!(updated.balance, 42);

    let missing = store
        .executor()
        .run_in_transaction(&TxContext::background(), |repo| {
            Box::pin(async move { repo.add_account_balance(AccountId::new(i64::MAX), 1).await })
        })
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_rolled_back_work_leaves_no_trace() {
    let Some(store) = setup().await else { return };
    let account = open(&store, 0).await;
    let id = account.account_id();

    let result = store
        .executor()
        .run_in_transaction(&TxContext::background(), move |repo| {
            Box::pin(async move {
                repo.add_account_balance(id, 500).await?;
                repo.create_entry(id, 500).await?;
                Err::<(), _>(DbErr::Custom("abandon".into()))
            })
        })
        .await;
    assert!(result.is_err());

    assert_eq!(store.get_account(id).await.unwrap().balance, 0);
    let entries = store
        .list_entries(id, PageRequest::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_delete_account_without_history() {
    let Some(store) = setup().await else { return };
    let empty = open(&store, 0).await;
    let funded = open(&store, 10).await;

    let repo: LedgerRepository<'_, _> = store.repository();
    assert!(repo.delete_account(empty.account_id()).await.unwrap());
    assert!(!repo.delete_account(empty.account_id()).await.unwrap());

    // entries reference the account
    assert!(repo.delete_account(funded.account_id()).await.is_err());
}
