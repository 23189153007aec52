//! Domain types for transfer requests.

use bank_shared::types::AccountId;
use serde::{Deserialize, Serialize};

/// A request to move `amount` minor units between two accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Account to debit.
    pub from_account_id: AccountId,
    /// Account to credit.
    pub to_account_id: AccountId,
    /// Amount in the currency's smallest unit.
    pub amount: i64,
}

impl TransferRequest {
    /// Creates a transfer request.
    #[must_use]
    pub const fn new(from_account_id: AccountId, to_account_id: AccountId, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Which side of a transfer an account is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegRole {
    /// The debited account.
    Source,
    /// The credited account.
    Destination,
}

/// One account's half of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    /// Account touched by this leg.
    pub account_id: AccountId,
    /// Side of the transfer.
    pub role: LegRole,
    /// Signed balance change: negative for the source, positive for the destination.
    pub delta: i64,
}

impl Leg {
    /// Builds the debit leg for `amount`.
    #[must_use]
    pub const fn debit(account_id: AccountId, amount: i64) -> Self {
        Self {
            account_id,
            role: LegRole::Source,
            delta: -amount,
        }
    }

    /// Builds the credit leg for `amount`.
    #[must_use]
    pub const fn credit(account_id: AccountId, amount: i64) -> Self {
        Self {
            account_id,
            role: LegRole::Destination,
            delta: amount,
        }
    }

    /// Returns true for the debited side.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self.role, LegRole::Source)
    }
}
