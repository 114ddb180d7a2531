//! In-memory trust token.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use splitsettle_common::{Address, Amount};

use crate::config::TokenConfig;
use crate::error::{TokenError, TokenResult};
use crate::ledger::{TransferReceipt, ValueLedger};

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenState {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> TokenResult<(Amount, Amount)> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: *from,
                required: amount,
                available: from_balance,
            });
        }

        if from == to {
            return Ok((from_balance, from_balance));
        }

        let to_after = self
            .balance(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let from_after = from_balance - amount;

        self.balances.insert(*from, from_after);
        self.balances.insert(*to, to_after);
        Ok((from_after, to_after))
    }
}

/// Fungible token minted by deposit at a fixed rate.
///
/// All state sits behind one mutex, so every operation is atomic with
/// respect to every other.
pub struct TrustToken {
    config: TokenConfig,
    state: Mutex<TokenState>,
}

impl TrustToken {
    /// Create a token with no supply.
    pub fn new(config: TokenConfig) -> Self {
        Self {
            config,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Token configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Convert a deposit into balance for `account` at the configured rate.
    ///
    /// Returns the number of tokens credited.
    pub fn mint(&self, account: &Address, deposit: Amount) -> TokenResult<Amount> {
        if deposit == 0 {
            return Err(TokenError::ZeroDeposit);
        }

        let minted = deposit
            .checked_mul(self.config.mint_rate)
            .ok_or(TokenError::Overflow)?;

        let mut state = self.state.lock();
        let supply = state
            .total_supply
            .checked_add(minted)
            .ok_or(TokenError::Overflow)?;
        let balance = state
            .balance(account)
            .checked_add(minted)
            .ok_or(TokenError::Overflow)?;

        state.total_supply = supply;
        state.balances.insert(*account, balance);

        info!(
            account = %account,
            deposit = %deposit,
            minted = %minted,
            symbol = %self.config.symbol,
            "Tokens minted"
        );

        Ok(minted)
    }

    /// Set the amount `spender` may move on behalf of `owner` (overwrites).
    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        let mut state = self.state.lock();
        if amount == 0 {
            state.allowances.remove(&(*owner, *spender));
        } else {
            state.allowances.insert((*owner, *spender), amount);
        }

        debug!(owner = %owner, spender = %spender, amount = %amount, "Allowance set");
    }

    /// Move `amount` from `from` to `to` without an allowance.
    pub fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> TokenResult<TransferReceipt> {
        let mut state = self.state.lock();
        let (from_balance_after, to_balance_after) = state.move_balance(from, to, amount)?;

        Ok(TransferReceipt {
            from: *from,
            to: *to,
            amount,
            from_balance_after,
            to_balance_after,
            timestamp: Utc::now(),
        })
    }

    /// Total tokens in existence.
    pub fn total_supply(&self) -> Amount {
        self.state.lock().total_supply
    }
}

impl Default for TrustToken {
    fn default() -> Self {
        Self::new(TokenConfig::default())
    }
}

impl ValueLedger for TrustToken {
    fn balance_of(&self, account: &Address) -> Amount {
        self.state.lock().balance(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .lock()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<TransferReceipt> {
        let mut state = self.state.lock();

        let approved = state
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0);
        if approved < amount {
            warn!(
                owner = %owner,
                spender = %spender,
                required = %amount,
                approved = %approved,
                "Transfer rejected: insufficient allowance"
            );
            return Err(TokenError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                required: amount,
                approved,
            });
        }

        let (from_balance_after, to_balance_after) = state.move_balance(owner, to, amount)?;

        let remaining = approved - amount;
        if remaining == 0 {
            state.allowances.remove(&(*owner, *spender));
        } else {
            state.allowances.insert((*owner, *spender), remaining);
        }

        debug!(
            owner = %owner,
            to = %to,
            amount = %amount,
            "Transfer executed"
        );

        Ok(TransferReceipt {
            from: *owner,
            to: *to,
            amount,
            from_balance_after,
            to_balance_after,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn token_with_rate(rate: u128) -> TrustToken {
        TrustToken::new(TokenConfig {
            mint_rate: rate,
            ..TokenConfig::default()
        })
    }

    #[test]
    fn test_mint_applies_rate() {
        let token = token_with_rate(1000);

        assert_eq!(token.mint(&addr(1), 3).unwrap(), 3000);
        assert_eq!(token.balance_of(&addr(1)), 3000);
        assert_eq!(token.total_supply(), 3000);
    }

    #[test]
    fn test_mint_zero_deposit_fails() {
        let token = TrustToken::default();
        assert_eq!(token.mint(&addr(1), 0), Err(TokenError::ZeroDeposit));
        assert_eq!(token.total_supply(), 0);
    }

    #[test]
    fn test_mint_overflow() {
        let token = token_with_rate(2);
        assert_eq!(token.mint(&addr(1), Amount::MAX), Err(TokenError::Overflow));
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let token = TrustToken::default();
        let (owner, spender, to) = (addr(1), addr(9), addr(2));
        token.mint(&owner, 100).unwrap();

        let err = token.transfer_from(&spender, &owner, &to, 10).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { approved: 0, .. }));
        assert_eq!(token.balance_of(&owner), 100);
        assert_eq!(token.balance_of(&to), 0);

        token.approve(&owner, &spender, 15);
        let receipt = token.transfer_from(&spender, &owner, &to, 10).unwrap();

        assert_eq!(receipt.from_balance_after, 90);
        assert_eq!(receipt.to_balance_after, 10);
        assert_eq!(token.allowance(&owner, &spender), 5);
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let token = TrustToken::default();
        let (owner, spender, to) = (addr(1), addr(9), addr(2));
        token.mint(&owner, 5).unwrap();
        token.approve(&owner, &spender, 50);

        let err = token.transfer_from(&spender, &owner, &to, 10).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { available: 5, .. }));
        assert_eq!(token.allowance(&owner, &spender), 50);
        assert_eq!(token.balance_of(&owner), 5);
    }

    #[test]
    fn test_approve_overwrites() {
        let token = TrustToken::default();
        token.approve(&addr(1), &addr(2), 100);
        token.approve(&addr(1), &addr(2), 0);
        assert_eq!(token.allowance(&addr(1), &addr(2)), 0);
    }

    #[test]
    fn test_direct_transfer() {
        let token = TrustToken::default();
        token.mint(&addr(1), 10).unwrap();

        token.transfer(&addr(1), &addr(2), 4).unwrap();
        assert_eq!(token.balance_of(&addr(1)), 6);
        assert_eq!(token.balance_of(&addr(2)), 4);
        assert!(token.transfer(&addr(2), &addr(1), 5).is_err());
    }

    proptest! {
        #[test]
        fn property_transfers_conserve_supply(
            minted in 1u128..10_000,
            amounts in proptest::collection::vec(0u128..5_000, 0..16),
        ) {
            let token = TrustToken::default();
            token.mint(&addr(1), minted).unwrap();
            token.approve(&addr(1), &addr(9), Amount::MAX);

            for amount in amounts {
                let _ = token.transfer_from(&addr(9), &addr(1), &addr(2), amount);
            }

            prop_assert_eq!(
                token.balance_of(&addr(1)) + token.balance_of(&addr(2)),
                token.total_supply()
            );
        }
    }
}
