//! Pairwise directed-debt table.

use std::collections::HashMap;

use tracing::debug;

use splitsettle_common::{
    checked_add, Address, Amount, GroupId, Result, SimplifiedEdge, SplitSettleError,
};

use crate::journal::{ChangeKind, DebtChange};

type PairKey = (Address, Address);

/// The debt table for every group.
///
/// Only positive entries are stored; reading a missing entry yields zero, and
/// driving an entry to zero removes it. Opposing debts between the same two
/// addresses are kept side by side and never netted. Entries are partitioned
/// per group so that clearing a group touches only that group's entries.
#[derive(Debug, Clone, Default)]
pub struct DebtLedger {
    groups: HashMap<GroupId, HashMap<PairKey, Amount>>,
}

impl DebtLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount `debtor` owes `creditor` in `group_id` (zero when absent).
    pub fn debt_of(&self, group_id: GroupId, debtor: &Address, creditor: &Address) -> Amount {
        self.groups
            .get(&group_id)
            .and_then(|entries| entries.get(&(*debtor, *creditor)))
            .copied()
            .unwrap_or(0)
    }

    /// Add `amount` to an entry.
    pub fn increase(
        &mut self,
        group_id: GroupId,
        debtor: Address,
        creditor: Address,
        amount: Amount,
    ) -> Result<DebtChange> {
        reject_self_debt(&debtor, &creditor)?;
        let before = self.debt_of(group_id, &debtor, &creditor);
        let after = checked_add(before, amount)?;
        self.write(group_id, debtor, creditor, after);
        Ok(DebtChange::new(
            group_id,
            debtor,
            creditor,
            ChangeKind::Increase,
            before,
            after,
        ))
    }

    /// Apply a batch of increases all-or-nothing.
    ///
    /// Every resulting amount is computed first (repeated pairs accumulate);
    /// if any of them overflows, or any delta is a self debt, the ledger is
    /// left untouched. Changes are returned in the order of `deltas`.
    pub fn apply_increases(
        &mut self,
        group_id: GroupId,
        deltas: &[(Address, Address, Amount)],
    ) -> Result<Vec<DebtChange>> {
        let mut staged: HashMap<PairKey, Amount> = HashMap::with_capacity(deltas.len());
        let mut changes = Vec::with_capacity(deltas.len());

        for (debtor, creditor, amount) in deltas {
            reject_self_debt(debtor, creditor)?;
            let key = (*debtor, *creditor);
            let before = match staged.get(&key) {
                Some(value) => *value,
                None => self.debt_of(group_id, debtor, creditor),
            };
            let after = checked_add(before, *amount)?;
            staged.insert(key, after);
            changes.push(DebtChange::new(
                group_id,
                *debtor,
                *creditor,
                ChangeKind::Increase,
                before,
                after,
            ));
        }

        for ((debtor, creditor), amount) in staged {
            self.write(group_id, debtor, creditor, amount);
        }

        Ok(changes)
    }

    /// Overwrite an entry with `amount`.
    pub fn set(
        &mut self,
        group_id: GroupId,
        debtor: Address,
        creditor: Address,
        amount: Amount,
    ) -> Result<DebtChange> {
        reject_self_debt(&debtor, &creditor)?;
        let before = self.debt_of(group_id, &debtor, &creditor);
        self.write(group_id, debtor, creditor, amount);
        Ok(DebtChange::new(
            group_id,
            debtor,
            creditor,
            ChangeKind::Set,
            before,
            amount,
        ))
    }

    /// Subtract `amount` from an entry.
    pub fn decrease(
        &mut self,
        group_id: GroupId,
        debtor: Address,
        creditor: Address,
        amount: Amount,
    ) -> Result<DebtChange> {
        let before = self.debt_of(group_id, &debtor, &creditor);
        let after = before
            .checked_sub(amount)
            .ok_or(SplitSettleError::ExceedsDebt {
                owed: before,
                requested: amount,
            })?;
        self.write(group_id, debtor, creditor, after);
        Ok(DebtChange::new(
            group_id,
            debtor,
            creditor,
            ChangeKind::Decrease,
            before,
            after,
        ))
    }

    /// Zero every entry of a group.
    ///
    /// Cost is proportional to the number of live entries in the group.
    pub fn clear_group(&mut self, group_id: GroupId) -> Vec<DebtChange> {
        let Some(entries) = self.groups.remove(&group_id) else {
            return Vec::new();
        };

        debug!(group_id = %group_id, cleared = entries.len(), "Clearing group debts");

        let mut changes: Vec<DebtChange> = entries
            .into_iter()
            .map(|((debtor, creditor), before)| {
                DebtChange::new(group_id, debtor, creditor, ChangeKind::Clear, before, 0)
            })
            .collect();
        changes.sort_by(|a, b| (a.debtor, a.creditor).cmp(&(b.debtor, b.creditor)));
        changes
    }

    /// Live entries of a group, ordered by `(debtor, creditor)`.
    pub fn entries(&self, group_id: GroupId) -> Vec<SimplifiedEdge> {
        let mut edges: Vec<SimplifiedEdge> = self
            .groups
            .get(&group_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|((debtor, creditor), amount)| {
                        SimplifiedEdge::new(*debtor, *creditor, *amount)
                    })
                    .collect()
            })
            .unwrap_or_default();
        edges.sort_by(|a, b| (a.debtor, a.creditor).cmp(&(b.debtor, b.creditor)));
        edges
    }

    /// Number of live entries in a group.
    pub fn live_entry_count(&self, group_id: GroupId) -> usize {
        self.groups.get(&group_id).map(|e| e.len()).unwrap_or(0)
    }

    fn write(&mut self, group_id: GroupId, debtor: Address, creditor: Address, amount: Amount) {
        if amount == 0 {
            if let Some(entries) = self.groups.get_mut(&group_id) {
                entries.remove(&(debtor, creditor));
                if entries.is_empty() {
                    self.groups.remove(&group_id);
                }
            }
        } else {
            self.groups
                .entry(group_id)
                .or_default()
                .insert((debtor, creditor), amount);
        }
    }
}

fn reject_self_debt(debtor: &Address, creditor: &Address) -> Result<()> {
    if debtor == creditor {
        return Err(SplitSettleError::SelfDebt(*debtor));
    }
    Ok(())
}
