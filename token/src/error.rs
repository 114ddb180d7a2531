//! Value ledger error types.

use splitsettle_common::{Address, Amount};
use thiserror::Error;

/// Errors raised by a value ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Mint called without a deposit.
    #[error("Send a non-zero deposit to mint")]
    ZeroDeposit,

    /// Owner balance does not cover the transfer.
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: Amount,
        available: Amount,
    },

    /// Spender allowance does not cover the transfer.
    #[error("Insufficient allowance from {owner} to {spender}: required {required}, approved {approved}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: Amount,
        approved: Amount,
    },

    /// Balance or supply would overflow.
    #[error("Token arithmetic overflow")]
    Overflow,
}

/// Result type for value ledger operations.
pub type TokenResult<T> = Result<T, TokenError>;
