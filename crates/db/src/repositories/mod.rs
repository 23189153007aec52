//! Repository abstractions for data access.
//!
//! Repositories borrow a connection instead of owning one, so the same
//! queries run on the pool or inside a transaction.

pub mod ledger;

pub use ledger::LedgerRepository;
