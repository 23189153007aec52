//! Database seeder for bank ledger development and testing.
//!
//! Applies pending migrations, opens a pair of demo accounts per currency and
//! moves a small amount between the USD pair. Safe to run repeatedly:
//! accounts that already exist are reused.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use bank_core::transfer::TransferRequest;
use bank_db::entities::accounts;
use bank_db::migration::{Migrator, MigratorTrait};
use bank_db::{AccountError, OpenAccount, Store, TxContext};
use bank_shared::AppConfig;
use bank_shared::types::{Currency, PageRequest};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo owners and their opening balance in minor units.
const DEMO_OWNERS: [(&str, i64); 2] = [("alice", 100_000), ("bob", 50_000)];

/// Amount moved by the demo transfer.
const DEMO_TRANSFER: i64 = 2_500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bank=debug,sea_orm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = bank_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    Migrator::up(&db, None).await.context("failed to run migrations")?;

    let store = Store::with_config(db, &config.ledger);
    let ctx = TxContext::background();

    for currency in Currency::ALL {
        for (owner, balance) in DEMO_OWNERS {
            let account = seed_account(&store, &ctx, owner, currency, balance).await?;
            info!(
                account_id = %account.account_id(),
                owner,
                %currency,
                balance = account.balance,
                "demo account ready"
            );
        }
    }

    let alice = seed_account(&store, &ctx, "alice", Currency::Usd, 0).await?;
    let bob = seed_account(&store, &ctx, "bob", Currency::Usd, 0).await?;

    let result = store
        .transfer(
            &ctx,
            TransferRequest::new(alice.account_id(), bob.account_id(), DEMO_TRANSFER),
        )
        .await
        .context("demo transfer failed")?;
    info!(
        transfer_id = %result.transfer.transfer_id(),
        alice = result.from_account.balance,
        bob = result.to_account.balance,
        "demo transfer complete"
    );

    for account in [alice, bob] {
        let audit = store.audit_account(&ctx, account.account_id()).await?;
        info!(
            account_id = %audit.account_id,
            balance = audit.balance,
            entries_sum = audit.entries_sum,
            consistent = audit.consistent,
            "audit"
        );
    }

    info!("Seeding complete");
    Ok(())
}

/// Opens an account, or returns the existing one for this owner and currency.
async fn seed_account(
    store: &Store,
    ctx: &TxContext,
    owner: &str,
    currency: Currency,
    opening_balance: i64,
) -> anyhow::Result<accounts::Model> {
    let input = OpenAccount {
        owner: owner.to_string(),
        currency,
        opening_balance,
    };
    match store.open_account(ctx, input).await {
        Ok(account) => Ok(account),
        Err(AccountError::Duplicate { .. }) => {
            let existing = store
                .list_accounts(owner, PageRequest::default())
                .await?
                .into_iter()
                .find(|a| a.currency == currency.code());
            existing.with_context(|| format!("{owner} has no {currency} account"))
        }
        Err(e) => Err(e.into()),
    }
}
