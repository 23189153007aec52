//! Typed IDs for type-safe ledger references.
//!
//! Ledger rows use database-assigned `BIGSERIAL` keys. Wrapping them prevents
//! accidentally passing an `EntryId` where an `AccountId` is expected. IDs are
//! totally ordered, which the transfer lock-ordering rule relies on.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates an ID from a raw database key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(AccountId, "Unique identifier for an account.");
typed_id!(EntryId, "Unique identifier for a ledger entry.");
typed_id!(TransferId, "Unique identifier for a transfer record.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_roundtrip_raw() {
        let id = AccountId::new(42);
        assert_eq!(id.into_inner(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(AccountId::from(42), id);
    }

    #[test]
    fn test_typed_id_ordering_follows_raw_key() {
        assert!(AccountId::new(3) < AccountId::new(10));
        assert_eq!(
            AccountId::new(10).max(AccountId::new(3)),
            AccountId::new(10)
        );
    }

    #[test]
    fn test_typed_id_display_and_parse() {
        let id = TransferId::new(991);
        assert_eq!(id.to_string(), "991");
        assert_eq!(TransferId::from_str("991").unwrap(), id);
        assert!(EntryId::from_str("not-a-number").is_err());
    }
}
