//! SplitSettle Value Ledger
//!
//! The settlement engine moves value through the [`ValueLedger`] trait: an
//! allowance-gated `transfer_from` plus balance and allowance lookups.
//! [`TrustToken`] is an in-memory implementation with mint-by-deposit at a
//! configured rate, used by tests and the simulator.

pub mod config;
pub mod error;
pub mod ledger;
pub mod trust_token;

pub use config::TokenConfig;
pub use error::{TokenError, TokenResult};
pub use ledger::{TransferReceipt, ValueLedger};
pub use trust_token::TrustToken;
