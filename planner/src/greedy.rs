//! Greedy largest-debtor-pays-largest-creditor simplification.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use serde::Serialize;
use tracing::debug;

use splitsettle_common::{checked_add, Address, Amount, Result, SimplifiedEdge};

/// Net position of one address across a set of debts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetBalance {
    /// Owed more than it owes.
    Creditor(Amount),
    /// Owes more than it is owed.
    Debtor(Amount),
    /// Owes exactly what it is owed.
    Even,
}

impl NetBalance {
    fn from_flows(incoming: Amount, outgoing: Amount) -> Self {
        match incoming.cmp(&outgoing) {
            Ordering::Greater => NetBalance::Creditor(incoming - outgoing),
            Ordering::Less => NetBalance::Debtor(outgoing - incoming),
            Ordering::Equal => NetBalance::Even,
        }
    }

    /// Whether the position is non-zero.
    pub fn is_open(&self) -> bool {
        !matches!(self, NetBalance::Even)
    }
}

/// Net position of every address appearing in `entries`.
///
/// Incoming and outgoing totals are summed separately, so the only failure
/// is one of those totals overflowing.
pub fn net_balances(entries: &[SimplifiedEdge]) -> Result<BTreeMap<Address, NetBalance>> {
    let mut flows: BTreeMap<Address, (Amount, Amount)> = BTreeMap::new();

    for entry in entries {
        if entry.debtor == entry.creditor {
            continue;
        }
        let debtor = flows.entry(entry.debtor).or_default();
        debtor.1 = checked_add(debtor.1, entry.amount)?;
        let creditor = flows.entry(entry.creditor).or_default();
        creditor.0 = checked_add(creditor.0, entry.amount)?;
    }

    Ok(flows
        .into_iter()
        .map(|(address, (incoming, outgoing))| (address, NetBalance::from_flows(incoming, outgoing)))
        .collect())
}

/// Heap entry ordered by amount, then by the lower address.
type Position = (Amount, Reverse<Address>);

/// Replace `entries` with an equivalent edge set of at most `k - 1` edges,
/// where `k` is the number of addresses with a non-zero net position.
///
/// At each step the largest remaining debtor pays the largest remaining
/// creditor the smaller of their two amounts; ties go to the lower address.
/// The output is deterministic, contains no zero or self edges and leaves
/// every address's net position unchanged.
pub fn greedy_simplify(entries: &[SimplifiedEdge]) -> Result<Vec<SimplifiedEdge>> {
    let balances = net_balances(entries)?;

    let mut debtors: BinaryHeap<Position> = BinaryHeap::new();
    let mut creditors: BinaryHeap<Position> = BinaryHeap::new();
    for (address, balance) in &balances {
        match balance {
            NetBalance::Debtor(amount) => debtors.push((*amount, Reverse(*address))),
            NetBalance::Creditor(amount) => creditors.push((*amount, Reverse(*address))),
            NetBalance::Even => {}
        }
    }

    let mut edges = Vec::with_capacity(debtors.len() + creditors.len());
    while let (Some((owes, Reverse(debtor))), Some((owed, Reverse(creditor)))) =
        (debtors.pop(), creditors.pop())
    {
        let payment = owes.min(owed);
        debug!(debtor = %debtor, creditor = %creditor, amount = %payment, "Planned payment");
        edges.push(SimplifiedEdge::new(debtor, creditor, payment));

        if owes > payment {
            debtors.push((owes - payment, Reverse(debtor)));
        }
        if owed > payment {
            creditors.push((owed - payment, Reverse(creditor)));
        }
    }

    Ok(edges)
}
