//! Expense splitting.
//!
//! Turns one expense into the list of debt increases it implies. Planning is
//! pure: it reads the group and the expense and returns a [`SplitPlan`]
//! without touching the ledger, so a rejected expense can never leave partial
//! increases behind.

use serde::Serialize;

use splitsettle_common::{
    checked_sum, split_floor, Address, Amount, ExpenseInput, Result, SplitSettleError,
    SplitStrategy,
};

use crate::registry::Group;

/// Debt increases implied by one expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    /// The paying member; every increase is owed to it.
    pub payer: Address,
    /// `(debtor, creditor, amount)` in participant order, payer excluded.
    pub increases: Vec<(Address, Address, Amount)>,
    /// Part of the expense recorded as nobody's debt: the payer's own share
    /// plus, for an equal split, the division remainder.
    pub unassigned: Amount,
}

impl SplitPlan {
    /// Sum of all planned increases.
    pub fn assigned(&self) -> Amount {
        self.increases
            .iter()
            .fold(0, |acc: Amount, (_, _, amount)| acc.saturating_add(*amount))
    }
}

/// Validate an expense against its group and plan its debt increases.
///
/// Checks, in order: the payer is a member, the amount is positive, there is
/// at least one participant, every participant is a member, and for an exact
/// split the shares are parallel to the participants and add up to the
/// amount.
pub fn plan_expense(group: &Group, payer: &Address, expense: &ExpenseInput) -> Result<SplitPlan> {
    group.require_member(payer)?;

    if expense.amount == 0 {
        return Err(SplitSettleError::ZeroAmount);
    }

    if expense.participants.is_empty() {
        return Err(SplitSettleError::NoParticipants);
    }

    for participant in &expense.participants {
        group.require_member(participant)?;
    }

    match expense.strategy {
        SplitStrategy::Equal => Ok(plan_equal(payer, expense)),
        SplitStrategy::Exact => plan_exact(payer, expense),
    }
}

fn plan_equal(payer: &Address, expense: &ExpenseInput) -> SplitPlan {
    let (share, _) = split_floor(expense.amount, expense.participants.len());

    let increases: Vec<(Address, Address, Amount)> = expense
        .participants
        .iter()
        .filter(|p| *p != payer)
        .map(|p| (*p, *payer, share))
        .collect();

    let assigned = share * increases.len() as Amount;

    SplitPlan {
        payer: *payer,
        increases,
        unassigned: expense.amount - assigned,
    }
}

fn plan_exact(payer: &Address, expense: &ExpenseInput) -> Result<SplitPlan> {
    if expense.shares.len() != expense.participants.len() {
        return Err(SplitSettleError::ShareCountMismatch {
            participants: expense.participants.len(),
            shares: expense.shares.len(),
        });
    }

    let total = checked_sum(&expense.shares)?;
    if total != expense.amount {
        return Err(SplitSettleError::SumMismatch {
            expected: expense.amount,
            actual: total,
        });
    }

    let mut increases = Vec::with_capacity(expense.participants.len());
    let mut unassigned: Amount = 0;
    for (participant, share) in expense.participants.iter().zip(&expense.shares) {
        if participant == payer {
            unassigned += share;
        } else {
            increases.push((*participant, *payer, *share));
        }
    }

    Ok(SplitPlan {
        payer: *payer,
        increases,
        unassigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GroupRegistry;
    use proptest::prelude::*;
    use splitsettle_common::GroupId;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn group_of(ns: &[u64]) -> (GroupRegistry, GroupId) {
        let mut registry = GroupRegistry::new();
        let id = registry
            .create_group(ns.iter().map(|n| addr(*n)).collect())
            .unwrap();
        (registry, id)
    }

    #[test]
    fn test_equal_split_excludes_payer() {
        let (registry, g) = group_of(&[1, 2, 3]);
        let group = registry.group(g).unwrap();

        let plan = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::equal(3, vec![addr(1), addr(2), addr(3)]),
        )
        .unwrap();

        assert_eq!(
            plan.increases,
            vec![(addr(2), addr(1), 1), (addr(3), addr(1), 1)]
        );
        assert_eq!(plan.unassigned, 1);
    }

    #[test]
    fn test_equal_split_payer_absorbs_remainder() {
        let (registry, g) = group_of(&[1, 2, 3]);
        let group = registry.group(g).unwrap();

        let plan = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::equal(10, vec![addr(1), addr(2), addr(3)]),
        )
        .unwrap();

        assert_eq!(plan.assigned(), 6);
        assert_eq!(plan.unassigned, 4);
    }

    #[test]
    fn test_equal_split_without_payer_among_participants() {
        let (registry, g) = group_of(&[1, 2, 3]);
        let group = registry.group(g).unwrap();

        let plan = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::equal(7, vec![addr(2), addr(3)]),
        )
        .unwrap();

        assert_eq!(plan.assigned(), 6);
        assert_eq!(plan.unassigned, 1);
    }

    #[test]
    fn test_exact_split() {
        let (registry, g) = group_of(&[1, 2, 3]);
        let group = registry.group(g).unwrap();

        let plan = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::exact(10, vec![addr(1), addr(2), addr(3)], vec![2, 3, 5]),
        )
        .unwrap();

        assert_eq!(
            plan.increases,
            vec![(addr(2), addr(1), 3), (addr(3), addr(1), 5)]
        );
        assert_eq!(plan.unassigned, 2);
    }

    #[test]
    fn test_exact_split_sum_mismatch() {
        let (registry, g) = group_of(&[1, 2, 3]);
        let group = registry.group(g).unwrap();

        let err = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::exact(10, vec![addr(1), addr(2), addr(3)], vec![2, 2, 2]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            SplitSettleError::SumMismatch {
                expected: 10,
                actual: 6
            }
        );
    }

    #[test]
    fn test_exact_split_share_count_mismatch() {
        let (registry, g) = group_of(&[1, 2]);
        let group = registry.group(g).unwrap();

        let err = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::exact(10, vec![addr(1), addr(2)], vec![10]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            SplitSettleError::ShareCountMismatch {
                participants: 2,
                shares: 1
            }
        );
    }

    #[test]
    fn test_exact_split_share_overflow() {
        let (registry, g) = group_of(&[1, 2]);
        let group = registry.group(g).unwrap();

        let err = plan_expense(
            group,
            &addr(1),
            &ExpenseInput::exact(10, vec![addr(1), addr(2)], vec![Amount::MAX, 1]),
        )
        .unwrap_err();

        assert_eq!(err, SplitSettleError::ArithmeticOverflow);
    }

    #[test]
    fn test_rejections() {
        let (registry, g) = group_of(&[1, 2]);
        let group = registry.group(g).unwrap();
        let everyone = vec![addr(1), addr(2)];

        assert!(matches!(
            plan_expense(group, &addr(9), &ExpenseInput::equal(4, everyone.clone())),
            Err(SplitSettleError::NotAMember { account, .. }) if account == addr(9)
        ));
        assert!(matches!(
            plan_expense(group, &addr(1), &ExpenseInput::equal(4, vec![addr(1), addr(9)])),
            Err(SplitSettleError::NotAMember { account, .. }) if account == addr(9)
        ));
        assert_eq!(
            plan_expense(group, &addr(1), &ExpenseInput::equal(0, everyone)),
            Err(SplitSettleError::ZeroAmount)
        );
        assert_eq!(
            plan_expense(group, &addr(1), &ExpenseInput::equal(4, Vec::new())),
            Err(SplitSettleError::NoParticipants)
        );
    }

    proptest! {
        #[test]
        fn property_equal_split_conserves(amount in 1u128..1_000_000, n in 2u64..40) {
            let members: Vec<u64> = (1..=n).collect();
            let (registry, g) = group_of(&members);
            let group = registry.group(g).unwrap();
            let participants: Vec<Address> = members.iter().map(|m| addr(*m)).collect();

            let plan = plan_expense(group, &addr(1), &ExpenseInput::equal(amount, participants)).unwrap();

            let share = amount / n as u128;
            prop_assert_eq!(plan.assigned(), (n as u128 - 1) * share);
            prop_assert_eq!(plan.assigned() + plan.unassigned, amount);
            prop_assert!(plan.increases.iter().all(|(d, c, a)| *c == addr(1) && *d != addr(1) && *a == share));
        }
    }
}
