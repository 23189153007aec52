//! Row-lock ordering for transfers.
//!
//! Every transfer locks its two account rows lower id first, whichever side is
//! the source. With a single total order over account ids no two transfers can
//! each hold one row while waiting on the other, so the wait-for graph between
//! transfers has no cycles.
//!
//! The order is a pure function of the two ids. It must be applied on every
//! transfer without exception: one caller locking in call order is enough to
//! reintroduce the A-waits-for-B / B-waits-for-A deadlock.

use bank_shared::types::AccountId;

use super::types::{Leg, TransferRequest};

/// The order in which a transfer acquires its two row locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOrder {
    first: AccountId,
    second: AccountId,
}

impl LockOrder {
    /// Orders a pair of accounts: `min` first, `max` second.
    #[must_use]
    pub fn for_pair(a: AccountId, b: AccountId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Account locked first.
    #[must_use]
    pub const fn first(&self) -> AccountId {
        self.first
    }

    /// Account locked second.
    #[must_use]
    pub const fn second(&self) -> AccountId {
        self.second
    }

    /// Returns the request's debit and credit legs in lock order.
    #[must_use]
    pub fn legs(request: &TransferRequest) -> [Leg; 2] {
        let debit = Leg::debit(request.from_account_id, request.amount);
        let credit = Leg::credit(request.to_account_id, request.amount);

        let order = Self::for_pair(request.from_account_id, request.to_account_id);
        if order.first == request.from_account_id {
            [debit, credit]
        } else {
            [credit, debit]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::types::LegRole;

    fn id(raw: i64) -> AccountId {
        AccountId::new(raw)
    }

    #[test]
    fn test_lower_id_locked_first() {
        let order = LockOrder::for_pair(id(9), id(4));
        assert_eq!(order.first(), id(4));
        assert_eq!(order.second(), id(9));
    }

    #[test]
    fn test_order_independent_of_direction() {
        assert_eq!(
            LockOrder::for_pair(id(1), id(2)),
            LockOrder::for_pair(id(2), id(1))
        );
    }

    #[test]
    fn test_legs_when_source_is_lower() {
        let legs = LockOrder::legs(&TransferRequest::new(id(1), id(2), 30));
        assert_eq!(legs[0], Leg::debit(id(1), 30));
        assert_eq!(legs[1], Leg::credit(id(2), 30));
    }

    #[test]
    fn test_legs_when_source_is_higher() {
        let legs = LockOrder::legs(&TransferRequest::new(id(8), id(3), 30));
        assert_eq!(legs[0].account_id, id(3));
        assert_eq!(legs[0].role, LegRole::Destination);
        assert_eq!(legs[0].delta, 30);
        assert_eq!(legs[1].account_id, id(8));
        assert_eq!(legs[1].role, LegRole::Source);
        assert_eq!(legs[1].delta, -30);
    }

    #[test]
    fn test_opposite_transfers_share_lock_sequence() {
        let ab = LockOrder::legs(&TransferRequest::new(id(5), id(6), 10));
        let ba = LockOrder::legs(&TransferRequest::new(id(6), id(5), 10));
        let ab_ids: Vec<_> = ab.iter().map(|l| l.account_id).collect();
        let ba_ids: Vec<_> = ba.iter().map(|l| l.account_id).collect();
        assert_eq!(ab_ids, ba_ids);
    }
}
