//! Simulation controller.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use splitsettle_common::{Address, Amount, ExpenseInput, GroupId, SplitSettleError};
use splitsettle_engine::{EngineConfig, EventEnvelope, SplitEngine};
use splitsettle_planner::SimplificationProposal;
use splitsettle_token::{TokenConfig, TrustToken, ValueLedger};

use crate::metrics::SimulationMetrics;
use crate::scenario::{AssertCondition, Scenario, ScenarioStep};

/// Drives one scenario against a fresh engine and token.
pub struct SimulationController {
    engine: SplitEngine,
    token: Arc<TrustToken>,
    members: Vec<Address>,
    group_id: Option<GroupId>,
    events: broadcast::Receiver<EventEnvelope>,
    metrics: SimulationMetrics,
}

impl SimulationController {
    /// Create a controller with `members` funded accounts.
    pub fn new(
        engine_config: EngineConfig,
        token_config: TokenConfig,
        members: usize,
    ) -> anyhow::Result<Self> {
        token_config.validate().map_err(anyhow::Error::msg)?;

        let token = Arc::new(TrustToken::new(token_config));
        let engine = SplitEngine::new(engine_config, token.clone())?;
        let events = engine.subscribe();
        let members = (1..=members as u64).map(Address::from_low_u64).collect();

        Ok(Self {
            engine,
            token,
            members,
            group_id: None,
            events,
            metrics: SimulationMetrics::new(),
        })
    }

    /// Fund every member with at least `budget` tokens, approve the engine
    /// and create the group.
    pub fn initialize(&mut self, budget: Amount) -> anyhow::Result<GroupId> {
        let rate = self.token.config().mint_rate;
        let deposit = budget.div_ceil(rate).max(1);
        let spender = self.engine.engine_address();

        for member in &self.members {
            self.token.mint(member, deposit)?;
            self.token.approve(member, &spender, Amount::MAX);
        }

        let creator = self.member(0)?;
        let group_id = self.engine.create_group(creator, self.members.clone())?;
        self.group_id = Some(group_id);

        info!(
            group_id = %group_id,
            members = self.members.len(),
            balance = %self.token.balance_of(&creator),
            symbol = %self.token.config().symbol,
            "Simulation initialized"
        );

        Ok(group_id)
    }

    /// Run every step of a scenario.
    ///
    /// Failed assertions are recorded in the metrics; only engine errors
    /// outside the scenario's expectations abort the run.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        for step in &scenario.steps {
            self.execute_step(step)?;
        }
        self.drain_events();

        Ok(())
    }

    fn execute_step(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        let group_id = self.group()?;

        match step {
            ScenarioStep::Expense {
                payer,
                amount,
                strategy,
                participants,
                shares,
            } => {
                let payer = self.member(*payer)?;
                let participants = participants
                    .iter()
                    .map(|p| self.member(*p))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let expense = ExpenseInput {
                    amount: *amount,
                    strategy: *strategy,
                    participants,
                    shares: shares.clone(),
                };

                self.engine.register_expense(payer, group_id, expense)?;
                self.metrics.expenses += 1;
            }
            ScenarioStep::Simplify { committer } => {
                let committer = self.member(*committer)?;
                let proposal = self.propose(group_id)?;

                self.engine
                    .commit_simplification(committer, group_id, proposal.digest)?;
                self.engine.apply_simplification(
                    committer,
                    group_id,
                    &proposal.edges,
                    &proposal.digest,
                )?;

                self.metrics.simplifications += 1;
                self.metrics.entries_removed += proposal.reduction() as u64;
                info!(
                    before = proposal.replaces,
                    after = proposal.edges.len(),
                    "Simplification applied"
                );
            }
            ScenarioStep::RaceCommits { stale, winner } => {
                self.race_commits(group_id, *stale, *winner)?;
            }
            ScenarioStep::SettleAll => {
                self.settle_all(group_id)?;
            }
            ScenarioStep::Assert { condition } => {
                self.check(group_id, condition)?;
            }
        }

        Ok(())
    }

    fn race_commits(&mut self, group_id: GroupId, stale: usize, winner: usize) -> anyhow::Result<()> {
        let stale = self.member(stale)?;
        let winner = self.member(winner)?;

        let plan = self.propose(group_id)?;
        let entries = self.engine.group_debts(group_id)?;
        let rival = SimplificationProposal::from_edges(group_id, entries.clone(), entries.len());

        self.engine
            .commit_simplification(stale, group_id, plan.digest)?;
        let replaced = self
            .engine
            .commit_simplification(winner, group_id, rival.digest)?;
        self.metrics.record_assertion(
            replaced == Some(plan.digest),
            "second commit should replace the first",
        );

        match self
            .engine
            .apply_simplification(stale, group_id, &plan.edges, &plan.digest)
        {
            Err(SplitSettleError::DigestMismatch { .. }) => {
                self.metrics.overtaken_applies += 1;
                self.metrics.record_assertion(true, "stale apply rejected");
            }
            Err(e) => return Err(e.into()),
            Ok(_) => {
                self.metrics
                    .record_assertion(false, "stale apply should have been rejected");
                return Ok(());
            }
        }

        warn!(member = %stale, "Commit overtaken, committing again");
        self.engine
            .commit_simplification(stale, group_id, plan.digest)?;
        self.engine
            .apply_simplification(stale, group_id, &plan.edges, &plan.digest)?;

        self.metrics.simplifications += 1;
        self.metrics.entries_removed += plan.reduction() as u64;
        Ok(())
    }

    fn settle_all(&mut self, group_id: GroupId) -> anyhow::Result<()> {
        for debt in self.engine.group_debts(group_id)? {
            let started = Instant::now();
            match self
                .engine
                .settle_debt(debt.debtor, group_id, debt.creditor, debt.amount)
            {
                Ok(receipt) => {
                    let latency = started.elapsed().as_micros() as u64;
                    self.metrics.record_settlement(receipt.amount, latency);
                }
                Err(e) => {
                    warn!(debtor = %debt.debtor, creditor = %debt.creditor, error = %e, "Settlement failed");
                    self.metrics.record_failure();
                }
            }
        }
        Ok(())
    }

    fn check(&mut self, group_id: GroupId, condition: &AssertCondition) -> anyhow::Result<()> {
        let (passed, description) = match condition {
            AssertCondition::DebtEquals {
                debtor,
                creditor,
                amount,
            } => {
                let actual = self.engine.debt_of(
                    group_id,
                    &self.member(*debtor)?,
                    &self.member(*creditor)?,
                );
                (
                    actual == *amount,
                    format!(
                        "debt {} -> {}: expected {}, got {}",
                        debtor, creditor, amount, actual
                    ),
                )
            }
            AssertCondition::AtMostDebts { count } => {
                let open = self.engine.group_debts(group_id)?.len();
                (
                    open <= *count,
                    format!("expected at most {} open debts, got {}", count, open),
                )
            }
            AssertCondition::NoDebts => {
                let open = self.engine.group_debts(group_id)?.len();
                (open == 0, format!("expected no open debts, got {}", open))
            }
        };

        if !passed {
            warn!("Assertion failed: {}", description);
        }
        self.metrics.record_assertion(passed, description);
        Ok(())
    }

    fn propose(&self, group_id: GroupId) -> anyhow::Result<SimplificationProposal> {
        let entries = self.engine.group_debts(group_id)?;
        Ok(SimplificationProposal::from_entries(group_id, &entries)?)
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(envelope) => self.metrics.record_event(envelope.event.name()),
                Err(TryRecvError::Lagged(missed)) => self.metrics.events_missed += missed,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn member(&self, index: usize) -> anyhow::Result<Address> {
        self.members
            .get(index)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Scenario refers to member {} of {}", index, self.members.len()))
    }

    fn group(&self) -> anyhow::Result<GroupId> {
        self.group_id
            .ok_or_else(|| anyhow::anyhow!("Simulation not initialized"))
    }

    /// The engine under simulation.
    pub fn engine(&self) -> &SplitEngine {
        &self.engine
    }

    /// Get simulation metrics.
    pub fn get_metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::UNIT;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(name: &str, members: usize, seed: u64) -> SimulationController {
        let scenario = Scenario::load(name, members, &mut StdRng::seed_from_u64(seed)).unwrap();
        let mut controller =
            SimulationController::new(EngineConfig::default(), TokenConfig::default(), scenario.members)
                .unwrap();
        controller.initialize(scenario.total_expense()).unwrap();
        controller.run_scenario(&scenario).unwrap();
        controller
    }

    #[test]
    fn test_weekend_trip() {
        let controller = run("weekend-trip", 4, 0);
        let metrics = controller.get_metrics();

        assert!(metrics.all_passed(), "{:?}", metrics.assertion_failures);
        assert_eq!(metrics.expenses, 2);
        assert_eq!(metrics.value_settled, 60 * UNIT);
        assert_eq!(metrics.events["debt_settled"], metrics.successful_settlements);
    }

    #[test]
    fn test_overtaken_commit() {
        let controller = run("overtaken-commit", 3, 0);
        let metrics = controller.get_metrics();

        assert!(metrics.all_passed(), "{:?}", metrics.assertion_failures);
        assert_eq!(metrics.overtaken_applies, 1);
        assert_eq!(controller.engine().metrics().commitments_overwritten, 1);
    }

    #[test]
    fn test_large_group() {
        let controller = run("large-group", 12, 42);
        let metrics = controller.get_metrics();

        assert!(metrics.all_passed(), "{:?}", metrics.assertion_failures);
        assert_eq!(metrics.failed_settlements, 0);
    }
}
