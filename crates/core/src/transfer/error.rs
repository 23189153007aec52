//! Transfer rule violations.
//!
//! These are the failures the pure rules can detect on their own. Store and
//! transaction failures are added on top of them by the database layer.

use bank_shared::types::AccountId;
use thiserror::Error;

/// Errors raised by transfer validation and settlement rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferRuleError {
    // ========== Validation Errors ==========
    /// Amount is zero or negative.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Source and destination are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    /// Accounts hold different currencies.
    #[error("Currency mismatch: account {from_account_id} is {from_currency}, account {to_account_id} is {to_currency}")]
    CurrencyMismatch {
        /// Source account.
        from_account_id: AccountId,
        /// Source account currency.
        from_currency: String,
        /// Destination account.
        to_account_id: AccountId,
        /// Destination account currency.
        to_currency: String,
    },

    // ========== Business Rule Errors ==========
    /// Debit would leave the source balance negative.
    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        /// Source account.
        account_id: AccountId,
        /// Balance observed under the row lock.
        balance: i64,
        /// Requested transfer amount.
        amount: i64,
    },

    /// Credit would overflow the balance column.
    #[error("Balance overflow on account {0}")]
    BalanceOverflow(AccountId),
}

impl TransferRuleError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
        }
    }

    /// Returns true if the error is detected before any lock is taken.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::SameAccount(_) | Self::CurrencyMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferRuleError::InvalidAmount(0).error_code(), "INVALID_AMOUNT");
        assert_eq!(
            TransferRuleError::SameAccount(AccountId::new(1)).error_code(),
            "SAME_ACCOUNT"
        );
        assert_eq!(
            TransferRuleError::InsufficientFunds {
                account_id: AccountId::new(1),
                balance: 100,
                amount: 200,
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(TransferRuleError::InvalidAmount(-10).is_validation());
        assert!(TransferRuleError::SameAccount(AccountId::new(3)).is_validation());
        assert!(!TransferRuleError::BalanceOverflow(AccountId::new(3)).is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = TransferRuleError::InsufficientFunds {
            account_id: AccountId::new(7),
            balance: 100,
            amount: 200,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account 7: balance 100, requested 200"
        );
    }
}
