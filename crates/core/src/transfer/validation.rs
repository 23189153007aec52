//! Transfer validation and per-leg settlement rules.

use bank_shared::types::AccountId;

use super::error::TransferRuleError;
use super::lock_order::LockOrder;
use super::types::{Leg, TransferRequest};

/// A request that passed validation, with its legs in lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    request: TransferRequest,
    legs: [Leg; 2],
}

impl TransferPlan {
    /// Validates `request` and computes its lock order.
    ///
    /// Rejects a non-positive amount and a self-transfer. Nothing here
    /// touches the store, so these failures never take a lock.
    pub fn new(request: TransferRequest) -> Result<Self, TransferRuleError> {
        validate_request(&request)?;
        Ok(Self {
            request,
            legs: LockOrder::legs(&request),
        })
    }

    /// The validated request.
    #[must_use]
    pub const fn request(&self) -> &TransferRequest {
        &self.request
    }

    /// Legs in the order their rows must be locked.
    #[must_use]
    pub const fn legs(&self) -> &[Leg; 2] {
        &self.legs
    }

    /// Transfer amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.request.amount
    }
}

/// Checks the preconditions of a transfer request.
pub fn validate_request(request: &TransferRequest) -> Result<(), TransferRuleError> {
    if request.amount <= 0 {
        return Err(TransferRuleError::InvalidAmount(request.amount));
    }
    if request.from_account_id == request.to_account_id {
        return Err(TransferRuleError::SameAccount(request.from_account_id));
    }
    Ok(())
}

/// Requires both accounts to hold the same currency.
pub fn ensure_same_currency(
    from_account_id: AccountId,
    from_currency: &str,
    to_account_id: AccountId,
    to_currency: &str,
) -> Result<(), TransferRuleError> {
    if from_currency == to_currency {
        return Ok(());
    }
    Err(TransferRuleError::CurrencyMismatch {
        from_account_id,
        from_currency: from_currency.to_string(),
        to_account_id,
        to_currency: to_currency.to_string(),
    })
}

/// Applies `leg` to a balance read under the row lock.
///
/// Returns the balance the account will hold afterwards. A debit may not take
/// the balance below zero and no leg may overflow.
pub fn settle_leg(leg: &Leg, balance: i64) -> Result<i64, TransferRuleError> {
    let next = balance
        .checked_add(leg.delta)
        .ok_or(TransferRuleError::BalanceOverflow(leg.account_id))?;

    if leg.is_source() && next < 0 {
        return Err(TransferRuleError::InsufficientFunds {
            account_id: leg.account_id,
            balance,
            amount: -leg.delta,
        });
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(raw: i64) -> AccountId {
        AccountId::new(raw)
    }

    #[rstest]
    #[case(0)]
    #[case(-10)]
    #[case(i64::MIN)]
    fn test_non_positive_amount_rejected(#[case] amount: i64) {
        let result = TransferPlan::new(TransferRequest::new(id(1), id(2), amount));
        assert_eq!(result, Err(TransferRuleError::InvalidAmount(amount)));
    }

    #[test]
    fn test_self_transfer_rejected() {
        let result = TransferPlan::new(TransferRequest::new(id(4), id(4), 10));
        assert_eq!(result, Err(TransferRuleError::SameAccount(id(4))));
    }

    #[test]
    fn test_amount_checked_before_same_account() {
        let result = TransferPlan::new(TransferRequest::new(id(4), id(4), 0));
        assert_eq!(result, Err(TransferRuleError::InvalidAmount(0)));
    }

    #[test]
    fn test_plan_orders_legs() {
        let plan = TransferPlan::new(TransferRequest::new(id(20), id(10), 5)).unwrap();
        assert_eq!(plan.legs()[0].account_id, id(10));
        assert_eq!(plan.legs()[1].account_id, id(20));
        assert_eq!(plan.amount(), 5);
    }

    #[test]
    fn test_currency_mismatch() {
        assert!(ensure_same_currency(id(1), "USD", id(2), "USD").is_ok());
        let err = ensure_same_currency(id(1), "USD", id(2), "EUR").unwrap_err();
        assert_eq!(err.error_code(), "CURRENCY_MISMATCH");
    }

    #[test]
    fn test_settle_debit() {
        assert_eq!(settle_leg(&Leg::debit(id(1), 30), 100), Ok(70));
        assert_eq!(settle_leg(&Leg::debit(id(1), 100), 100), Ok(0));
    }

    #[test]
    fn test_settle_debit_insufficient() {
        assert_eq!(
            settle_leg(&Leg::debit(id(1), 200), 100),
            Err(TransferRuleError::InsufficientFunds {
                account_id: id(1),
                balance: 100,
                amount: 200,
            })
        );
    }

    #[test]
    fn test_settle_credit() {
        assert_eq!(settle_leg(&Leg::credit(id(2), 30), 50), Ok(80));
    }

    #[test]
    fn test_settle_credit_overflow() {
        assert_eq!(
            settle_leg(&Leg::credit(id(2), 1), i64::MAX),
            Err(TransferRuleError::BalanceOverflow(id(2)))
        );
    }
}
