//! Funds-transfer rules.
//!
//! This module holds the store-independent half of a transfer:
//! - Request validation (positive amount, distinct accounts, matching currency)
//! - The lock-ordering rule that keeps concurrent transfers deadlock free
//! - Per-leg settlement (non-negative debits, overflow-checked credits)
//! - Error types for rule violations

pub mod error;
pub mod lock_order;
pub mod types;
pub mod validation;

#[cfg(test)]
mod props;

pub use error::TransferRuleError;
pub use lock_order::LockOrder;
pub use types::{Leg, LegRole, TransferRequest};
pub use validation::{ensure_same_currency, settle_leg, validate_request, TransferPlan};
