//! Database layer with `SeaORM` entities, repositories and the transfer engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for accounts, entries and transfers
//! - The ledger repository used by every read and write
//! - A transaction executor with deadline and cancellation support
//! - The [`Store`], which opens accounts and moves funds between them
//! - Database migrations

pub mod entities;
pub mod error;
pub mod executor;
pub mod migration;
pub mod repositories;
pub mod store;

pub use error::{AccountError, TransferError, TransferStep};
pub use executor::{Abort, Executor, TxContext, TxError};
pub use repositories::LedgerRepository;
pub use store::{BalanceAudit, OpenAccount, Store, TransferResult};

use bank_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured pool limits.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout())
        .acquire_timeout(config.connect_timeout())
        .sqlx_logging(false);
    Database::connect(options).await
}
