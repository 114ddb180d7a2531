//! Journal of debt changes made by a single call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitsettle_common::{Address, Amount, GroupId};

/// Kind of mutation applied to a debt entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Debt grew (expense split).
    Increase,
    /// Debt overwritten (simplification apply).
    Set,
    /// Debt reduced (settlement).
    Decrease,
    /// Debt zeroed by a group clear.
    Clear,
}

/// One change to one debt entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtChange {
    /// Group the entry belongs to.
    pub group_id: GroupId,
    /// Owing side.
    pub debtor: Address,
    /// Owed side.
    pub creditor: Address,
    /// Change type.
    pub kind: ChangeKind,
    /// Amount before the change.
    pub before: Amount,
    /// Amount after the change.
    pub after: Amount,
    /// When the change was made.
    pub recorded_at: DateTime<Utc>,
}

impl DebtChange {
    /// Create a change record stamped with the current time.
    pub fn new(
        group_id: GroupId,
        debtor: Address,
        creditor: Address,
        kind: ChangeKind,
        before: Amount,
        after: Amount,
    ) -> Self {
        Self {
            group_id,
            debtor,
            creditor,
            kind,
            before,
            after,
            recorded_at: Utc::now(),
        }
    }

    /// Whether the entry grew.
    pub fn is_increase(&self) -> bool {
        self.after > self.before
    }

    /// Absolute size of the change.
    pub fn magnitude(&self) -> Amount {
        self.after.abs_diff(self.before)
    }
}

/// Changes made by one call, in the order they were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtJournal {
    /// Entries in application order.
    pub entries: Vec<DebtChange>,
}

impl DebtJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change.
    pub fn record(&mut self, change: DebtChange) {
        self.entries.push(change);
    }

    /// Add several changes.
    pub fn extend(&mut self, changes: impl IntoIterator<Item = DebtChange>) {
        self.entries.extend(changes);
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total growth across all increasing changes (saturating).
    pub fn total_increase(&self) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.is_increase())
            .fold(0, |acc: Amount, e| acc.saturating_add(e.magnitude()))
    }

    /// Total reduction across all decreasing changes (saturating).
    pub fn total_decrease(&self) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.after < e.before)
            .fold(0, |acc: Amount, e| acc.saturating_add(e.magnitude()))
    }

    /// Changes of a given kind.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &DebtChange> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(kind: ChangeKind, before: Amount, after: Amount) -> DebtChange {
        DebtChange::new(
            GroupId::new(0),
            Address::from_low_u64(1),
            Address::from_low_u64(2),
            kind,
            before,
            after,
        )
    }

    #[test]
    fn test_journal_totals() {
        let mut journal = DebtJournal::new();
        journal.record(change(ChangeKind::Increase, 0, 5));
        journal.record(change(ChangeKind::Increase, 5, 8));
        journal.record(change(ChangeKind::Decrease, 8, 2));

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.total_increase(), 8);
        assert_eq!(journal.total_decrease(), 6);
        assert_eq!(journal.of_kind(ChangeKind::Increase).count(), 2);
    }

    #[test]
    fn test_change_magnitude() {
        assert_eq!(change(ChangeKind::Set, 7, 2).magnitude(), 5);
        assert!(!change(ChangeKind::Clear, 7, 0).is_increase());
    }
}
