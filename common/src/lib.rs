//! SplitSettle Common Types
//!
//! This crate contains shared types used across the SplitSettle workspace,
//! including participant identities, amounts, expense and edge payloads, and
//! the error taxonomy every core operation reports.

pub mod identifiers;
pub mod amount;
pub mod expense;
pub mod edge;
pub mod error;

pub use identifiers::*;
pub use amount::*;
pub use expense::*;
pub use edge::*;
pub use error::*;
