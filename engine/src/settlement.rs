//! Debt settlement through the value ledger.

use std::sync::Arc;

use tracing::{debug, warn};

use splitsettle_common::{Address, Amount, Result, SplitSettleError};
use splitsettle_ledger::{DebtChange, DebtLedger};
use splitsettle_token::{TransferReceipt, ValueLedger};

use crate::registry::Group;

/// Outcome of a successful settlement.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// Receipt returned by the value ledger.
    pub receipt: TransferReceipt,
    /// The debt decrease recorded afterwards.
    pub change: DebtChange,
}

/// Moves value from debtor to creditor and reduces the debt by the same
/// amount.
///
/// The engine acts as spender on the value ledger, so a debtor must approve
/// `spender` for at least the settled amount beforehand.
pub struct SettlementEngine {
    value_ledger: Arc<dyn ValueLedger>,
    spender: Address,
}

impl SettlementEngine {
    /// Create a settlement engine spending as `spender`.
    pub fn new(value_ledger: Arc<dyn ValueLedger>, spender: Address) -> Self {
        Self {
            value_ledger,
            spender,
        }
    }

    /// Address used as spender on the value ledger.
    pub fn spender(&self) -> &Address {
        &self.spender
    }

    /// Settle `amount` of what `debtor` owes `creditor` in `group`.
    ///
    /// The debt is only reduced after the transfer succeeded; a rejected
    /// transfer leaves the ledger untouched.
    pub fn settle(
        &self,
        debts: &mut DebtLedger,
        group: &Group,
        debtor: &Address,
        creditor: &Address,
        amount: Amount,
    ) -> Result<Settlement> {
        group.require_member(debtor)?;

        if amount == 0 {
            return Err(SplitSettleError::ZeroAmount);
        }

        let owed = debts.debt_of(group.id, debtor, creditor);
        if amount > owed {
            return Err(SplitSettleError::ExceedsDebt {
                owed,
                requested: amount,
            });
        }

        let receipt = self
            .value_ledger
            .transfer_from(&self.spender, debtor, creditor, amount)
            .map_err(|e| {
                warn!(
                    group_id = %group.id,
                    debtor = %debtor,
                    creditor = %creditor,
                    amount = %amount,
                    error = %e,
                    "Value transfer rejected"
                );
                SplitSettleError::Transfer(e.to_string())
            })?;

        debug!(
            group_id = %group.id,
            debtor = %debtor,
            creditor = %creditor,
            amount = %amount,
            "Value transferred"
        );

        let change = debts.decrease(group.id, *debtor, *creditor, amount)?;

        Ok(Settlement { receipt, change })
    }
}
