//! Simulation scenarios.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use splitsettle_common::{Amount, SplitStrategy};

/// A simulation scenario over one group.
///
/// Members are referred to by index; member `0` creates the group.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Group size.
    pub members: usize,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize)]
pub enum ScenarioStep {
    /// Member `payer` registers an expense.
    Expense {
        payer: usize,
        amount: Amount,
        strategy: SplitStrategy,
        participants: Vec<usize>,
        shares: Vec<Amount>,
    },
    /// Member `committer` plans, commits and applies a simplification.
    Simplify { committer: usize },
    /// `stale` commits a plan, `winner` overwrites it with another one; the
    /// stale apply must fail, then `stale` commits again and applies.
    RaceCommits { stale: usize, winner: usize },
    /// Every debtor settles every open debt in full.
    SettleAll,
    /// Assert a condition.
    Assert { condition: AssertCondition },
}

/// Conditions that can be asserted.
#[derive(Debug, Clone, Serialize)]
pub enum AssertCondition {
    /// `debtor` owes `creditor` exactly `amount`.
    DebtEquals {
        debtor: usize,
        creditor: usize,
        amount: Amount,
    },
    /// The group has at most `count` open debts.
    AtMostDebts { count: usize },
    /// The group has no open debts.
    NoDebts,
}

/// Token units per whole unit in scenario amounts.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

impl Scenario {
    /// Names accepted by [`Scenario::load`].
    pub const NAMES: [&'static str; 3] = ["weekend-trip", "large-group", "overtaken-commit"];

    /// Load a scenario by name.
    ///
    /// `members` and `rng` only shape `large-group`.
    pub fn load(name: &str, members: usize, rng: &mut StdRng) -> anyhow::Result<Self> {
        match name {
            "weekend-trip" => Ok(Self::weekend_trip()),
            "large-group" => Self::large_group(members, rng),
            "overtaken-commit" => Ok(Self::overtaken_commit()),
            _ => Err(anyhow::anyhow!(
                "Unknown scenario: {} (expected one of {})",
                name,
                Self::NAMES.join(", ")
            )),
        }
    }

    /// Sum of every expense amount; no member can end up owing more.
    pub fn total_expense(&self) -> Amount {
        self.steps
            .iter()
            .map(|step| match step {
                ScenarioStep::Expense { amount, .. } => *amount,
                _ => 0,
            })
            .fold(0, |acc: Amount, amount| acc.saturating_add(amount))
    }

    /// Alice and Bob each pay 60 for all four; Charlie and Dave end up
    /// paying both directly.
    fn weekend_trip() -> Self {
        let everyone = vec![0, 1, 2, 3];
        let fifteen = 15 * UNIT;

        let mut steps = vec![
            ScenarioStep::Expense {
                payer: 0,
                amount: 60 * UNIT,
                strategy: SplitStrategy::Equal,
                participants: everyone.clone(),
                shares: Vec::new(),
            },
            ScenarioStep::Expense {
                payer: 1,
                amount: 60 * UNIT,
                strategy: SplitStrategy::Equal,
                participants: everyone,
                shares: Vec::new(),
            },
        ];
        for (debtor, creditor) in [(1, 0), (2, 0), (3, 0), (0, 1), (2, 1), (3, 1)] {
            steps.push(expect_debt(debtor, creditor, fifteen));
        }

        steps.push(ScenarioStep::Simplify { committer: 0 });
        steps.push(expect_debt(1, 0, 0));
        steps.push(expect_debt(0, 1, 0));
        steps.push(ScenarioStep::Assert {
            condition: AssertCondition::AtMostDebts { count: 4 },
        });
        steps.push(ScenarioStep::SettleAll);
        steps.push(ScenarioStep::Assert {
            condition: AssertCondition::NoDebts,
        });

        Self {
            name: "weekend-trip".to_string(),
            description: "Four friends, two equal dinners, simplify then settle".to_string(),
            members: 4,
            steps,
        }
    }

    /// Random equal and exact expenses across a large group.
    fn large_group(members: usize, rng: &mut StdRng) -> anyhow::Result<Self> {
        if members < 2 {
            anyhow::bail!("large-group needs at least 2 members, got {}", members);
        }

        let mut steps = Vec::new();
        for _ in 0..members * 3 {
            let payer = rng.gen_range(0..members);
            let count = rng.gen_range(1..=members.min(16));
            let mut participants: Vec<usize> = (0..members).collect();
            for i in 0..count {
                let j = rng.gen_range(i..members);
                participants.swap(i, j);
            }
            participants.truncate(count);

            if rng.gen_bool(0.5) {
                steps.push(ScenarioStep::Expense {
                    payer,
                    amount: rng.gen_range(1..=500) * UNIT,
                    strategy: SplitStrategy::Equal,
                    participants,
                    shares: Vec::new(),
                });
            } else {
                let shares: Vec<Amount> = participants
                    .iter()
                    .map(|_| rng.gen_range(1..=100) * UNIT)
                    .collect();
                steps.push(ScenarioStep::Expense {
                    payer,
                    amount: shares.iter().sum(),
                    strategy: SplitStrategy::Exact,
                    participants,
                    shares,
                });
            }
        }

        steps.push(ScenarioStep::Simplify {
            committer: rng.gen_range(0..members),
        });
        steps.push(ScenarioStep::Assert {
            condition: AssertCondition::AtMostDebts {
                count: members - 1,
            },
        });
        steps.push(ScenarioStep::SettleAll);
        steps.push(ScenarioStep::Assert {
            condition: AssertCondition::NoDebts,
        });

        Ok(Self {
            name: "large-group".to_string(),
            description: format!("{} members, random equal and exact expenses", members),
            members,
            steps,
        })
    }

    /// A chain of debts two members try to simplify at the same time.
    fn overtaken_commit() -> Self {
        Self {
            name: "overtaken-commit".to_string(),
            description: "A later commit overwrites an earlier one".to_string(),
            members: 3,
            steps: vec![
                ScenarioStep::Expense {
                    payer: 1,
                    amount: 10 * UNIT,
                    strategy: SplitStrategy::Exact,
                    participants: vec![0],
                    shares: vec![10 * UNIT],
                },
                ScenarioStep::Expense {
                    payer: 2,
                    amount: 10 * UNIT,
                    strategy: SplitStrategy::Exact,
                    participants: vec![1],
                    shares: vec![10 * UNIT],
                },
                ScenarioStep::RaceCommits { stale: 0, winner: 2 },
                expect_debt(0, 2, 10 * UNIT),
                expect_debt(1, 2, 0),
                ScenarioStep::SettleAll,
                ScenarioStep::Assert {
                    condition: AssertCondition::NoDebts,
                },
            ],
        }
    }
}

fn expect_debt(debtor: usize, creditor: usize, amount: Amount) -> ScenarioStep {
    ScenarioStep::Assert {
        condition: AssertCondition::DebtEquals {
            debtor,
            creditor,
            amount,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_load_known_scenarios() {
        let mut rng = StdRng::seed_from_u64(7);
        for name in Scenario::NAMES {
            let scenario = Scenario::load(name, 6, &mut rng).unwrap();
            assert_eq!(scenario.name, name);
            assert!(!scenario.steps.is_empty());
        }
        assert!(Scenario::load("nope", 6, &mut rng).is_err());
    }

    #[test]
    fn test_total_expense() {
        let mut rng = StdRng::seed_from_u64(0);
        let scenario = Scenario::load("weekend-trip", 4, &mut rng).unwrap();
        assert_eq!(scenario.total_expense(), 120 * UNIT);
    }

    #[test]
    fn test_large_group_is_seeded() {
        let a = Scenario::load("large-group", 12, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = Scenario::load("large-group", 12, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_large_group_exact_shares_add_up() {
        let scenario = Scenario::load("large-group", 10, &mut StdRng::seed_from_u64(3)).unwrap();
        for step in &scenario.steps {
            if let ScenarioStep::Expense {
                amount,
                strategy: SplitStrategy::Exact,
                shares,
                participants,
                ..
            } = step
            {
                assert_eq!(shares.len(), participants.len());
                assert_eq!(shares.iter().sum::<Amount>(), *amount);
            }
        }
    }
}
