//! Transaction executor.
//!
//! [`Executor::run_in_transaction`] opens a transaction, hands the unit of work
//! a [`LedgerRepository`] bound to it, and commits on success or rolls back on
//! any failure. A caller deadline or cancellation while the work runs is a
//! failure like any other: the transaction is rolled back and the reason is
//! reported.
//!
//! # Usage
//!
//! ```ignore
//! let entry = executor
//!     .run_in_transaction(&TxContext::background(), move |repo| {
//!         Box::pin(async move { repo.create_entry(account_id, 100).await })
//!     })
//!     .await?;
//! ```

use std::fmt::Display;
use std::time::Duration;

use futures::future::BoxFuture;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::repositories::LedgerRepository;

/// Deadline and cancellation carried into a transaction.
#[derive(Debug, Clone)]
pub struct TxContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for TxContext {
    fn default() -> Self {
        Self::background()
    }
}

impl TxContext {
    /// A context with no deadline that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Bounds the context to `timeout` from now, keeping any earlier deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Bounds the context to `deadline`, keeping any earlier deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The token that cancels work running under this context.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns true once the token is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }
}

/// Why a transaction was rolled back.
#[derive(Debug, Error)]
pub enum Abort<E> {
    /// The unit of work returned an error.
    #[error("{0}")]
    Work(E),

    /// The context deadline passed.
    #[error("deadline exceeded")]
    Timeout,

    /// The context was cancelled.
    #[error("cancelled by caller")]
    Cancelled,
}

/// Outcome of a failed [`Executor::run_in_transaction`] call.
#[derive(Debug, Error)]
pub enum TxError<E> {
    /// No transaction was opened; nothing ran.
    #[error("could not begin transaction: {0}")]
    Begin(#[source] DbErr),

    /// The transaction was rolled back cleanly.
    #[error("transaction rolled back: {0}")]
    Aborted(Abort<E>),

    /// The rollback itself failed. Both failures are kept.
    #[error("{cause}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// Why the rollback was attempted.
        cause: Abort<E>,
        /// Why it failed.
        rollback: DbErr,
    },

    /// The commit failed; the store may or may not have applied the work.
    #[error("commit failed, outcome unknown: {0}")]
    CommitFailed(#[source] DbErr),
}

impl<E> TxError<E> {
    /// Returns true if the caller cannot know whether the work was persisted.
    #[must_use]
    pub const fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::CommitFailed(_))
    }
}

/// Runs units of work inside database transactions.
///
/// Holds the shared connection pool; cloning is cheap.
#[derive(Debug, Clone)]
pub struct Executor {
    db: DatabaseConnection,
}

impl Executor {
    /// Creates an executor over a connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `work` inside one transaction.
    ///
    /// Every read and write inside `work` must go through the repository it is
    /// given. The transaction commits only if `work` succeeds before the
    /// context's deadline and without being cancelled; otherwise it is rolled
    /// back. A context that is already cancelled or expired never begins.
    ///
    /// When the context has a deadline, PostgreSQL's `lock_timeout` is set for
    /// the transaction too, so row-lock waits end on the server side.
    pub async fn run_in_transaction<T, E, F>(
        &self,
        ctx: &TxContext,
        work: F,
    ) -> Result<T, TxError<E>>
    where
        F: for<'c> FnOnce(LedgerRepository<'c, DatabaseTransaction>) -> BoxFuture<'c, Result<T, E>>,
        E: From<DbErr> + Display,
    {
        if ctx.is_cancelled() {
            return Err(TxError::Aborted(Abort::Cancelled));
        }
        if ctx.is_expired() {
            return Err(TxError::Aborted(Abort::Timeout));
        }

        let txn = self.db.begin().await.map_err(TxError::Begin)?;

        let outcome = drive(&txn, ctx, work).await;

        match outcome {
            Ok(value) => match txn.commit().await {
                Ok(()) => {
                    debug!("transaction committed");
                    Ok(value)
                }
                Err(e) => {
                    error!(error = %e, "transaction commit failed, outcome unknown");
                    Err(TxError::CommitFailed(e))
                }
            },
            Err(cause) => match txn.rollback().await {
                Ok(()) => {
                    warn!(reason = %cause, "transaction rolled back");
                    Err(TxError::Aborted(cause))
                }
                Err(rollback) => {
                    error!(reason = %cause, error = %rollback, "transaction rollback failed");
                    Err(TxError::RollbackFailed { cause, rollback })
                }
            },
        }
    }
}

/// Runs the unit of work under the context's deadline and cancellation token.
async fn drive<T, E, F>(txn: &DatabaseTransaction, ctx: &TxContext, work: F) -> Result<T, Abort<E>>
where
    F: for<'c> FnOnce(LedgerRepository<'c, DatabaseTransaction>) -> BoxFuture<'c, Result<T, E>>,
    E: From<DbErr>,
{
    if let Some(remaining) = ctx.remaining() {
        let millis = remaining.as_millis().max(1);
        txn.execute_unprepared(&format!("SET LOCAL lock_timeout = {millis}"))
            .await
            .map_err(|e| Abort::Work(E::from(e)))?;
    }

    let work = work(LedgerRepository::new(txn));
    let bounded = async {
        match ctx.remaining() {
            Some(remaining) => match tokio::time::timeout(remaining, work).await {
                Ok(result) => result.map_err(Abort::Work),
                Err(_) => Err(Abort::Timeout),
            },
            None => work.await.map_err(Abort::Work),
        }
    };

    tokio::select! {
        biased;
        () = ctx.cancel.cancelled() => Err(Abort::Cancelled),
        result = bounded => result,
    }
}
