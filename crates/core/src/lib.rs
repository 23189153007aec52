//! Core business logic for the bank ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! The transfer rules live here so they can be tested without a store.
//!
//! # Modules
//!
//! - `transfer` - Request validation, lock ordering and balance settlement

pub mod transfer;
