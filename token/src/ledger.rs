//! Value ledger interface consumed by settlement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitsettle_common::{Address, Amount};

use crate::error::TokenResult;

/// Record of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Account debited.
    pub from: Address,
    /// Account credited.
    pub to: Address,
    /// Amount moved.
    pub amount: Amount,
    /// Sender balance after the transfer.
    pub from_balance_after: Amount,
    /// Recipient balance after the transfer.
    pub to_balance_after: Amount,
    /// When the transfer happened.
    pub timestamp: DateTime<Utc>,
}

/// A fungible value ledger with owner-controlled allowances.
///
/// Implementations must make `transfer_from` atomic: either the allowance,
/// both balances and the receipt all reflect the transfer, or nothing
/// changed and an error is returned.
pub trait ValueLedger: Send + Sync {
    /// Balance held by `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Amount `spender` may still move on behalf of `owner`.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `owner` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<TransferReceipt>;
}
