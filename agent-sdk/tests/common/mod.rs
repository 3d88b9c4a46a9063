//! Shared test utilities for agent client tests.

pub mod mock_ledger;

#[allow(unused_imports)]
pub use mock_ledger::*;
