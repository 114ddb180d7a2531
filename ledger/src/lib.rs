//! SplitSettle Debt Ledger
//!
//! Pairwise directed-debt table keyed by `(group, debtor, creditor)`, with a
//! per-call journal of every change it makes.

pub mod debt;
pub mod journal;

pub use debt::DebtLedger;
pub use journal::{ChangeKind, DebtChange, DebtJournal};
