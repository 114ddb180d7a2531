//! Expense input types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Address, Amount};

/// Rule used to turn one expense into a set of debt increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitStrategy {
    /// Every participant owes `amount / n`, rounded down.
    Equal,
    /// Every participant owes the share listed at its index.
    Exact,
}

impl SplitStrategy {
    /// Decode the wire code used by callers (0 = equal, 1 = exact).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SplitStrategy::Equal),
            1 => Some(SplitStrategy::Exact),
            _ => None,
        }
    }

    /// Wire code of this strategy.
    pub fn code(&self) -> u8 {
        match self {
            SplitStrategy::Equal => 0,
            SplitStrategy::Exact => 1,
        }
    }
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitStrategy::Equal => write!(f, "equal"),
            SplitStrategy::Exact => write!(f, "exact"),
        }
    }
}

/// A single expense paid by the caller.
///
/// Expenses are never stored; they only produce debt increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseInput {
    /// Total amount paid.
    pub amount: Amount,
    /// Splitting rule.
    pub strategy: SplitStrategy,
    /// Ordered participants sharing the expense.
    pub participants: Vec<Address>,
    /// Shares parallel to `participants` (exact split only).
    #[serde(default)]
    pub shares: Vec<Amount>,
}

impl ExpenseInput {
    /// Equal split of `amount` across `participants`.
    pub fn equal(amount: Amount, participants: Vec<Address>) -> Self {
        Self {
            amount,
            strategy: SplitStrategy::Equal,
            participants,
            shares: Vec::new(),
        }
    }

    /// Exact split with one share per participant.
    pub fn exact(amount: Amount, participants: Vec<Address>, shares: Vec<Amount>) -> Self {
        Self {
            amount,
            strategy: SplitStrategy::Exact,
            participants,
            shares,
        }
    }
}
