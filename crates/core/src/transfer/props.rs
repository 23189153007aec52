//! Property-based tests for transfer planning and settlement.
//!
//! Feature: transfer-engine, Properties: Lock Order, Conservation, Non-negativity

use bank_shared::types::AccountId;
use proptest::prelude::*;

use super::error::TransferRuleError;
use super::lock_order::LockOrder;
use super::types::TransferRequest;
use super::validation::{settle_leg, TransferPlan};

fn account_id() -> impl Strategy<Value = AccountId> {
    (1i64..10_000).prop_map(AccountId::new)
}

fn distinct_pair() -> impl Strategy<Value = (AccountId, AccountId)> {
    (account_id(), account_id()).prop_filter("accounts must differ", |(a, b)| a != b)
}

fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 1: Lock order is a function of the pair, not of direction.
    #[test]
    fn prop_lock_order_direction_independent((a, b) in distinct_pair()) {
        let forward = LockOrder::for_pair(a, b);
        let backward = LockOrder::for_pair(b, a);
        prop_assert_eq!(forward, backward);
        prop_assert_eq!(forward.first(), a.min(b));
        prop_assert_eq!(forward.second(), a.max(b));
    }

    /// Property 2: Planned legs are locked strictly ascending and pair up.
    #[test]
    fn prop_legs_ascending_and_balanced(
        (from, to) in distinct_pair(),
        amount in positive_amount(),
    ) {
        let plan = TransferPlan::new(TransferRequest::new(from, to, amount)).unwrap();
        let [first, second] = *plan.legs();

        prop_assert!(first.account_id < second.account_id);
        prop_assert_eq!(first.delta + second.delta, 0);

        let debit = if first.is_source() { first } else { second };
        prop_assert_eq!(debit.account_id, from);
        prop_assert_eq!(debit.delta, -amount);
    }

    /// Property 3: Settling both legs conserves the pair's total.
    #[test]
    fn prop_settlement_conserves_total(
        (from, to) in distinct_pair(),
        amount in positive_amount(),
        from_balance in 0i64..2_000_000_000,
        to_balance in 0i64..2_000_000_000,
    ) {
        let plan = TransferPlan::new(TransferRequest::new(from, to, amount)).unwrap();
        let mut settled = Vec::new();
        let mut rejected = false;

        for leg in plan.legs() {
            let balance = if leg.is_source() { from_balance } else { to_balance };
            match settle_leg(leg, balance) {
                Ok(next) => settled.push(next),
                Err(TransferRuleError::InsufficientFunds { .. }) => {
                    rejected = true;
                    break;
                }
                Err(other) => return Err(TestCaseError::fail(format!("{other}"))),
            }
        }

        if rejected {
            prop_assert!(amount > from_balance);
        } else {
            prop_assert_eq!(settled.iter().sum::<i64>(), from_balance + to_balance);
        }
    }

    /// Property 4: A debit never produces a negative balance.
    #[test]
    fn prop_debit_never_negative(
        (from, to) in distinct_pair(),
        amount in positive_amount(),
        balance in 0i64..2_000_000_000,
    ) {
        let plan = TransferPlan::new(TransferRequest::new(from, to, amount)).unwrap();
        for leg in plan.legs().iter().filter(|l| l.is_source()) {
            if let Ok(next) = settle_leg(leg, balance) {
                prop_assert!(next >= 0);
            }
        }
    }

    /// Property 5: Non-positive amounts never produce a plan.
    #[test]
    fn prop_non_positive_rejected((from, to) in distinct_pair(), amount in i64::MIN..=0) {
        prop_assert_eq!(
            TransferPlan::new(TransferRequest::new(from, to, amount)),
            Err(TransferRuleError::InvalidAmount(amount))
        );
    }
}
