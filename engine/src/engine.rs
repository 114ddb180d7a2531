//! The `SplitEngine` facade.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use splitsettle_common::{
    Address, Amount, EdgeDigest, ExpenseInput, GroupId, Result, SimplifiedEdge, SplitSettleError,
    SplitStrategy,
};
use splitsettle_ledger::{ChangeKind, DebtJournal, DebtLedger};
use splitsettle_token::{TransferReceipt, ValueLedger};

use crate::config::EngineConfig;
use crate::events::{EventEnvelope, EventFeed, LedgerEvent};
use crate::metrics::{EngineMetrics, MetricsSnapshot, SharedMetrics};
use crate::registry::GroupRegistry;
use crate::settlement::SettlementEngine;
use crate::simplification::{validate_edges, CommitmentBook, CommitmentSlot};
use crate::splitter::{plan_expense, SplitPlan};

/// Everything a call may mutate.
#[derive(Debug, Default)]
struct EngineState {
    registry: GroupRegistry,
    debts: DebtLedger,
    commitments: CommitmentBook,
}

/// Shared-expense ledger for groups of addresses.
///
/// All state sits behind one lock. Mutating calls hold the write lock for
/// their whole duration and check every precondition before the first
/// write, so a call either takes full effect or none.
pub struct SplitEngine {
    config: EngineConfig,
    state: RwLock<EngineState>,
    settlement: SettlementEngine,
    events: EventFeed,
    metrics: SharedMetrics,
}

impl SplitEngine {
    /// Create an engine settling through `value_ledger`.
    pub fn new(config: EngineConfig, value_ledger: Arc<dyn ValueLedger>) -> Result<Self> {
        config.validate().map_err(SplitSettleError::Configuration)?;

        info!(
            engine_address = %config.engine_address,
            max_participants = config.limits.max_participants_per_expense,
            max_edges = config.limits.max_edges_per_simplification,
            "Starting split engine"
        );

        Ok(Self {
            settlement: SettlementEngine::new(value_ledger, config.engine_address),
            events: EventFeed::new(config.event_capacity),
            metrics: Arc::new(EngineMetrics::new()),
            state: RwLock::new(EngineState::default()),
            config,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Address debtors must approve on the value ledger before settling.
    pub fn engine_address(&self) -> Address {
        *self.settlement.spender()
    }

    /// Create a group with `members` in order. The caller need not be one.
    #[instrument(skip_all, fields(caller = %caller, count = members.len()))]
    pub fn create_group(&self, caller: Address, members: Vec<Address>) -> Result<GroupId> {
        let result = self.check_limit(
            "member",
            members.len(),
            self.config.limits.max_initial_members,
        );
        let result = result.and_then(|_| {
            let mut state = self.state.write();
            state.registry.create_group(members.clone())
        });
        let group_id = self.track("create_group", result)?;

        self.metrics.group_created();
        info!(group_id = %group_id, members = members.len(), "Group created");
        self.events.publish(LedgerEvent::GroupCreated {
            group_id,
            creator: caller,
            members,
        });

        Ok(group_id)
    }

    /// Add the caller to a group.
    #[instrument(skip_all, fields(caller = %caller, group_id = %group_id))]
    pub fn join_group(&self, caller: Address, group_id: GroupId) -> Result<()> {
        let result = self.state.write().registry.join_group(group_id, caller);
        let member_count = self.track("join_group", result)?;

        self.metrics.member_joined();
        info!(group_id = %group_id, member = %caller, member_count, "Member joined");
        self.events.publish(LedgerEvent::MemberJoined {
            group_id,
            member: caller,
            member_count,
        });

        Ok(())
    }

    /// Members of a group, creation list first, then joins in call order.
    pub fn get_members(&self, group_id: GroupId) -> Result<Vec<Address>> {
        self.state.read().registry.members(group_id)
    }

    /// Record an expense paid by the caller.
    ///
    /// Returns the plan that was applied, including the amount nobody owes.
    #[instrument(
        skip_all,
        fields(caller = %caller, group_id = %group_id, amount = %expense.amount, strategy = %expense.strategy)
    )]
    pub fn register_expense(
        &self,
        caller: Address,
        group_id: GroupId,
        expense: ExpenseInput,
    ) -> Result<SplitPlan> {
        let result = self.apply_expense(&caller, group_id, &expense);
        let (plan, journal) = self.track("register_expense", result)?;

        self.metrics.expense_registered(plan.increases.len());
        info!(
            group_id = %group_id,
            payer = %caller,
            amount = %expense.amount,
            increases = plan.increases.len(),
            total_increase = %journal.total_increase(),
            unassigned = %plan.unassigned,
            "Expense registered"
        );
        self.events.publish(LedgerEvent::ExpenseRegistered {
            group_id,
            payer: caller,
            amount: expense.amount,
            strategy: expense.strategy,
            increases: plan.increases.len(),
            unassigned: plan.unassigned,
        });

        Ok(plan)
    }

    fn apply_expense(
        &self,
        caller: &Address,
        group_id: GroupId,
        expense: &ExpenseInput,
    ) -> Result<(SplitPlan, DebtJournal)> {
        let mut state = self.state.write();
        let EngineState {
            registry, debts, ..
        } = &mut *state;

        let group = registry.group(group_id)?;
        group.require_member(caller)?;

        let limit = self.config.limits.max_participants_per_expense;
        self.check_limit("participant", expense.participants.len(), limit)?;
        if matches!(expense.strategy, SplitStrategy::Exact) {
            self.check_limit("share", expense.shares.len(), limit)?;
        }

        let plan = plan_expense(group, caller, expense)?;

        let mut journal = DebtJournal::new();
        journal.extend(debts.apply_increases(group_id, &plan.increases)?);

        for change in &journal.entries {
            debug!(
                debtor = %change.debtor,
                creditor = %change.creditor,
                before = %change.before,
                after = %change.after,
                "Debt increased"
            );
        }

        Ok((plan, journal))
    }

    /// Amount `debtor` owes `creditor` in a group; zero when nothing is recorded.
    pub fn debt_of(&self, group_id: GroupId, debtor: &Address, creditor: &Address) -> Amount {
        self.state.read().debts.debt_of(group_id, debtor, creditor)
    }

    /// Store the caller's commitment to a simplified edge set.
    ///
    /// Overwrites any pending commitment and returns the digest it replaced.
    #[instrument(skip_all, fields(caller = %caller, group_id = %group_id, digest = %digest))]
    pub fn commit_simplification(
        &self,
        caller: Address,
        group_id: GroupId,
        digest: EdgeDigest,
    ) -> Result<Option<EdgeDigest>> {
        let result = self.store_commitment(&caller, group_id, digest);
        let replaced = self.track("commit_simplification", result)?;
        let replaced = replaced.digest().copied();

        self.metrics.commitment_stored(replaced.is_some());
        if let Some(previous) = &replaced {
            warn!(group_id = %group_id, previous = %previous, "Pending commitment overwritten");
        }
        info!(group_id = %group_id, committer = %caller, "Simplification committed");
        self.events.publish(LedgerEvent::SimplificationCommitted {
            group_id,
            committer: caller,
            digest,
            replaced,
        });

        Ok(replaced)
    }

    fn store_commitment(
        &self,
        caller: &Address,
        group_id: GroupId,
        digest: EdgeDigest,
    ) -> Result<CommitmentSlot> {
        let mut state = self.state.write();
        state.registry.group(group_id)?.require_member(caller)?;
        Ok(state.commitments.commit(group_id, digest, *caller))
    }

    /// Replace every debt of a group with a committed edge set.
    ///
    /// `edges` must hash to both `digest` and the pending commitment. On
    /// success the group's old entries are gone, each edge is written in
    /// order (the last edge for a pair wins) and the commitment is consumed.
    #[instrument(skip_all, fields(caller = %caller, group_id = %group_id, edges = edges.len()))]
    pub fn apply_simplification(
        &self,
        caller: Address,
        group_id: GroupId,
        edges: &[SimplifiedEdge],
        digest: &EdgeDigest,
    ) -> Result<DebtJournal> {
        let result = self.replace_debts(&caller, group_id, edges, digest);
        let journal = self.track("apply_simplification", result)?;

        let cleared = journal.of_kind(ChangeKind::Clear).count();
        self.metrics.simplification_applied();
        info!(
            group_id = %group_id,
            applier = %caller,
            cleared,
            edges = edges.len(),
            "Simplification applied"
        );
        self.events.publish(LedgerEvent::SimplificationApplied {
            group_id,
            applier: caller,
            digest: *digest,
            cleared,
            edges: edges.len(),
        });

        Ok(journal)
    }

    fn replace_debts(
        &self,
        caller: &Address,
        group_id: GroupId,
        edges: &[SimplifiedEdge],
        digest: &EdgeDigest,
    ) -> Result<DebtJournal> {
        let mut state = self.state.write();
        let EngineState {
            registry,
            debts,
            commitments,
        } = &mut *state;

        registry.group(group_id)?.require_member(caller)?;
        self.check_limit(
            "edge",
            edges.len(),
            self.config.limits.max_edges_per_simplification,
        )?;
        commitments.verify_reveal(group_id, edges, digest)?;
        validate_edges(edges)?;

        let mut journal = DebtJournal::new();
        journal.extend(debts.clear_group(group_id));
        for edge in edges {
            journal.record(debts.set(group_id, edge.debtor, edge.creditor, edge.amount)?);
        }
        commitments.consume(group_id);

        Ok(journal)
    }

    /// Pay `amount` of the caller's debt to `creditor` through the value ledger.
    ///
    /// The caller must have approved [`SplitEngine::engine_address`] for at
    /// least `amount`.
    #[instrument(skip_all, fields(caller = %caller, group_id = %group_id, creditor = %creditor, amount = %amount))]
    pub fn settle_debt(
        &self,
        caller: Address,
        group_id: GroupId,
        creditor: Address,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        let result = {
            let mut state = self.state.write();
            let EngineState {
                registry, debts, ..
            } = &mut *state;
            registry
                .group(group_id)
                .and_then(|group| self.settlement.settle(debts, group, &caller, &creditor, amount))
        };

        if matches!(result, Err(SplitSettleError::Transfer(_))) {
            self.metrics.settlement_failed();
        }
        let settlement = self.track("settle_debt", result)?;

        self.metrics.settlement_success();
        info!(
            group_id = %group_id,
            debtor = %caller,
            creditor = %creditor,
            amount = %amount,
            remaining = %settlement.change.after,
            "Debt settled"
        );
        self.events.publish(LedgerEvent::DebtSettled {
            group_id,
            debtor: caller,
            creditor,
            amount,
            remaining: settlement.change.after,
        });

        Ok(settlement.receipt)
    }

    /// Number of groups created.
    pub fn group_count(&self) -> u64 {
        self.state.read().registry.group_count()
    }

    /// Check membership; unknown groups have no members.
    pub fn is_member(&self, group_id: GroupId, account: &Address) -> bool {
        self.state.read().registry.is_member(group_id, account)
    }

    /// Commitment slot of a group.
    pub fn pending_commitment(&self, group_id: GroupId) -> Result<CommitmentSlot> {
        let state = self.state.read();
        state.registry.group(group_id)?;
        Ok(state.commitments.slot(group_id))
    }

    /// Live debt entries of a group, ordered by `(debtor, creditor)`.
    pub fn group_debts(&self, group_id: GroupId) -> Result<Vec<SimplifiedEdge>> {
        let state = self.state.read();
        state.registry.group(group_id)?;
        Ok(state.debts.entries(group_id))
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared handle to the live counters.
    pub fn shared_metrics(&self) -> SharedMetrics {
        self.metrics.clone()
    }

    fn check_limit(&self, what: &'static str, actual: usize, limit: usize) -> Result<()> {
        if actual > limit {
            return Err(SplitSettleError::InputTooLarge {
                what,
                actual,
                limit,
            });
        }
        Ok(())
    }

    fn track<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.metrics.call_rejected();
            warn!(operation, code = e.error_code(), error = %e, "Call rejected");
        }
        result
    }
}
