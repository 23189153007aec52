//! Error types for the ledger store.
//!
//! Every failure a caller can see is a typed variant with a stable
//! `error_code()`. Store failures keep the step and account they happened on.

use bank_core::transfer::TransferRuleError;
use bank_shared::types::{AccountId, Currency, CurrencyParseError};
use bank_shared::AppError;
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

use crate::executor::{Abort, TxError};

/// PostgreSQL `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// PostgreSQL `query_canceled`, raised by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

/// Returns the SQLSTATE code of a database error, if the driver reported one.
pub(crate) fn sql_state(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Returns true if the store gave up waiting for a lock or statement.
pub(crate) fn is_lock_timeout(err: &DbErr) -> bool {
    matches!(
        sql_state(err).as_deref(),
        Some(LOCK_NOT_AVAILABLE | QUERY_CANCELED)
    )
}

/// The step of a transfer at which a store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    /// Preparing the transaction (lock timeout setup).
    Prepare,
    /// Existence check before locking.
    LookupAccount,
    /// Row lock acquisition.
    LockAccount,
    /// Balance write.
    UpdateBalance,
    /// Entry insert.
    InsertEntry,
    /// Transfer record insert.
    InsertTransfer,
}

impl std::fmt::Display for TransferStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Prepare => "prepare transaction",
            Self::LookupAccount => "look up account",
            Self::LockAccount => "lock account",
            Self::UpdateBalance => "update balance",
            Self::InsertEntry => "insert entry",
            Self::InsertTransfer => "insert transfer",
        })
    }
}

fn describe_account(account_id: Option<&AccountId>) -> String {
    account_id.map_or_else(String::new, |id| format!(" for account {id}"))
}

/// Errors returned by [`crate::Store::transfer`].
#[derive(Debug, Error)]
pub enum TransferError {
    // ========== Validation Errors (no lock taken) ==========
    /// Amount is zero or negative.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Source equals destination.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    /// Accounts hold different currencies.
    #[error("Currency mismatch: account {from_account_id} is {from_currency}, account {to_account_id} is {to_currency}")]
    CurrencyMismatch {
        /// Source account.
        from_account_id: AccountId,
        /// Source currency.
        from_currency: String,
        /// Destination account.
        to_account_id: AccountId,
        /// Destination currency.
        to_currency: String,
    },

    // ========== Not Found ==========
    /// Either account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Business Rule Errors (rolled back) ==========
    /// Source balance would go negative.
    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        /// Source account.
        account_id: AccountId,
        /// Balance observed under the row lock.
        balance: i64,
        /// Requested amount.
        amount: i64,
    },

    /// Destination balance would overflow.
    #[error("Balance overflow on account {0}")]
    BalanceOverflow(AccountId),

    // ========== Infrastructure Errors ==========
    /// The deadline passed, usually while waiting on a row lock. Rolled back.
    #[error("Transfer timed out")]
    Timeout,

    /// The caller cancelled the transfer. Rolled back.
    #[error("Transfer cancelled")]
    Cancelled,

    /// A store call failed inside the transaction. Rolled back.
    #[error("Failed to {step}{}: {source}", describe_account(.account_id.as_ref()))]
    Query {
        /// Step that failed.
        step: TransferStep,
        /// Account the step was working on.
        account_id: Option<AccountId>,
        /// Underlying database error.
        source: DbErr,
    },

    /// Begin, commit or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] Box<TxError<TransferError>>),
}

impl TransferError {
    /// Wraps a store failure with the step and account it happened on.
    ///
    /// Lock and statement timeouts reported by the store become [`Self::Timeout`].
    pub fn query(step: TransferStep, account_id: Option<AccountId>, source: DbErr) -> Self {
        if is_lock_timeout(&source) {
            return Self::Timeout;
        }
        Self::Query {
            step,
            account_id,
            source,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Query { .. } => "DATABASE_ERROR",
            Self::TransactionFailed(inner) => match **inner {
                TxError::CommitFailed(_) => "COMMIT_FAILED",
                TxError::RollbackFailed { .. } => "ROLLBACK_FAILED",
                TxError::Begin(_) | TxError::Aborted(_) => "TRANSACTION_FAILED",
            },
        }
    }

    /// Returns true if retrying as a new transfer cannot double-apply this one.
    ///
    /// Everything here was rolled back or never started.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::TransactionFailed(inner) => matches!(**inner, TxError::Begin(_)),
            _ => false,
        }
    }

    /// Returns true if the transfer may or may not have been committed.
    ///
    /// The engine does not deduplicate: a caller retrying after this risks
    /// moving the funds twice.
    #[must_use]
    pub fn outcome_unknown(&self) -> bool {
        matches!(self, Self::TransactionFailed(inner) if inner.is_outcome_unknown())
    }
}

impl From<TransferRuleError> for TransferError {
    fn from(err: TransferRuleError) -> Self {
        match err {
            TransferRuleError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            TransferRuleError::SameAccount(id) => Self::SameAccount(id),
            TransferRuleError::CurrencyMismatch {
                from_account_id,
                from_currency,
                to_account_id,
                to_currency,
            } => Self::CurrencyMismatch {
                from_account_id,
                from_currency,
                to_account_id,
                to_currency,
            },
            TransferRuleError::InsufficientFunds {
                account_id,
                balance,
                amount,
            } => Self::InsufficientFunds {
                account_id,
                balance,
                amount,
            },
            TransferRuleError::BalanceOverflow(id) => Self::BalanceOverflow(id),
        }
    }
}

impl From<DbErr> for TransferError {
    fn from(err: DbErr) -> Self {
        Self::query(TransferStep::Prepare, None, err)
    }
}

impl From<TxError<TransferError>> for TransferError {
    fn from(err: TxError<TransferError>) -> Self {
        match err {
            TxError::Aborted(Abort::Work(inner)) => inner,
            TxError::Aborted(Abort::Timeout) => Self::Timeout,
            TxError::Aborted(Abort::Cancelled) => Self::Cancelled,
            other => Self::TransactionFailed(Box::new(other)),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        let message = err.to_string();
        match err {
            TransferError::InvalidAmount(_)
            | TransferError::SameAccount(_)
            | TransferError::CurrencyMismatch { .. } => Self::Validation(message),
            TransferError::AccountNotFound(_) => Self::NotFound(message),
            TransferError::InsufficientFunds { .. } | TransferError::BalanceOverflow(_) => {
                Self::BusinessRule(message)
            }
            TransferError::Timeout | TransferError::Cancelled => Self::Unavailable(message),
            TransferError::Query { .. } => Self::Database(message),
            TransferError::TransactionFailed(ref inner) if !inner.is_outcome_unknown() => {
                Self::Database(message)
            }
            TransferError::TransactionFailed(_) => Self::Internal(message),
        }
    }
}

/// Errors returned by account operations on [`crate::Store`].
#[derive(Debug, Error)]
pub enum AccountError {
    /// Currency code is not supported.
    #[error(transparent)]
    UnsupportedCurrency(#[from] CurrencyParseError),

    /// Opening balance below zero.
    #[error("Opening balance cannot be negative, got {0}")]
    NegativeOpeningBalance(i64),

    /// Owner already has an account in this currency.
    #[error("Owner {owner} already has a {currency} account")]
    Duplicate {
        /// Account owner.
        owner: String,
        /// Requested currency.
        currency: Currency,
    },

    /// Account does not exist.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// The deadline passed. Rolled back.
    #[error("Account operation timed out")]
    Timeout,

    /// The caller cancelled. Rolled back.
    #[error("Account operation cancelled")]
    Cancelled,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Begin, commit or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] Box<TxError<AccountError>>),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            Self::NegativeOpeningBalance(_) => "NEGATIVE_OPENING_BALANCE",
            Self::Duplicate { .. } => "DUPLICATE_ACCOUNT",
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::TransactionFailed(_) => "TRANSACTION_FAILED",
        }
    }

    /// Maps an insert failure, recognising the `(owner, currency)` unique key.
    pub(crate) fn from_insert(err: DbErr, owner: &str, currency: Currency) -> Self {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return Self::Duplicate {
                owner: owner.to_string(),
                currency,
            };
        }
        Self::Database(err)
    }
}

impl From<TxError<AccountError>> for AccountError {
    fn from(err: TxError<AccountError>) -> Self {
        match err {
            TxError::Aborted(Abort::Work(inner)) => inner,
            TxError::Aborted(Abort::Timeout) => Self::Timeout,
            TxError::Aborted(Abort::Cancelled) => Self::Cancelled,
            other => Self::TransactionFailed(Box::new(other)),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::UnsupportedCurrency(_) | AccountError::NegativeOpeningBalance(_) => {
                Self::Validation(message)
            }
            AccountError::Duplicate { .. } => Self::Conflict(message),
            AccountError::NotFound(_) => Self::NotFound(message),
            AccountError::Timeout | AccountError::Cancelled => Self::Unavailable(message),
            AccountError::Database(_) | AccountError::TransactionFailed(_) => {
                Self::Database(message)
            }
        }
    }
}
