//! Error types for SplitSettle operations.

use crate::{Address, Amount, EdgeDigest, GroupId};
use thiserror::Error;

/// Main error type for SplitSettle operations.
///
/// Every variant rejects the entire call: no operation leaves partial effects
/// behind when it returns one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitSettleError {
    /// Group creation with fewer than two members.
    #[error("Need at least 2 members, got {count}")]
    InsufficientMembers { count: usize },

    /// The same address appears twice in a creation list.
    #[error("Duplicate member {0} in group creation")]
    DuplicateMember(Address),

    /// Unknown group id.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    /// Caller or referenced participant is not a member of the group.
    #[error("{account} is not a member of group {group_id}")]
    NotAMember { group_id: GroupId, account: Address },

    /// Caller already belongs to the group.
    #[error("{account} already joined group {group_id}")]
    AlreadyMember { group_id: GroupId, account: Address },

    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Expense without participants.
    #[error("Expense has no participants")]
    NoParticipants,

    /// Exact split shares do not add up to the expense amount.
    #[error("Sum of shares {actual} != amount {expected}")]
    SumMismatch { expected: Amount, actual: Amount },

    /// Exact split shares are not parallel to participants.
    #[error("Got {shares} shares for {participants} participants")]
    ShareCountMismatch { participants: usize, shares: usize },

    /// Settlement or decrease larger than the recorded debt.
    #[error("Exceeds debt: owed {owed}, requested {requested}")]
    ExceedsDebt { owed: Amount, requested: Amount },

    /// Applied edge set does not hash to the committed or supplied digest.
    #[error("Digest mismatch for group {group_id}: computed {computed}")]
    DigestMismatch {
        group_id: GroupId,
        computed: EdgeDigest,
    },

    /// An edge would record a debt from an address to itself.
    #[error("Self debt for {0} is not allowed")]
    SelfDebt(Address),

    /// An addition would overflow the amount domain.
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Per-call input exceeds the configured bound.
    #[error("{what} count {actual} exceeds limit {limit}")]
    InputTooLarge {
        what: &'static str,
        actual: usize,
        limit: usize,
    },

    /// The external value ledger rejected the transfer.
    #[error("Transfer rejected: {0}")]
    Transfer(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SplitSettleError {
    /// Get the stable error code reported to callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            SplitSettleError::InsufficientMembers { .. } => "INSUFFICIENT_MEMBERS",
            SplitSettleError::DuplicateMember(_) => "DUPLICATE_MEMBER",
            SplitSettleError::GroupNotFound(_) => "GROUP_NOT_FOUND",
            SplitSettleError::NotAMember { .. } => "NOT_A_MEMBER",
            SplitSettleError::AlreadyMember { .. } => "ALREADY_MEMBER",
            SplitSettleError::ZeroAmount => "ZERO_AMOUNT",
            SplitSettleError::NoParticipants => "NO_PARTICIPANTS",
            SplitSettleError::SumMismatch { .. } => "SUM_MISMATCH",
            SplitSettleError::ShareCountMismatch { .. } => "SHARE_COUNT_MISMATCH",
            SplitSettleError::ExceedsDebt { .. } => "EXCEEDS_DEBT",
            SplitSettleError::DigestMismatch { .. } => "DIGEST_MISMATCH",
            SplitSettleError::SelfDebt(_) => "SELF_DEBT",
            SplitSettleError::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            SplitSettleError::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            SplitSettleError::Transfer(_) => "TRANSFER_REJECTED",
            SplitSettleError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Check whether the error originated outside the core (value ledger).
    pub fn is_external(&self) -> bool {
        matches!(self, SplitSettleError::Transfer(_))
    }
}

/// Result type alias for SplitSettle operations.
pub type Result<T> = std::result::Result<T, SplitSettleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SplitSettleError::GroupNotFound(GroupId::new(99)).error_code(),
            "GROUP_NOT_FOUND"
        );
        assert_eq!(
            SplitSettleError::ExceedsDebt {
                owed: 2,
                requested: 5
            }
            .error_code(),
            "EXCEEDS_DEBT"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = SplitSettleError::SumMismatch {
            expected: 10,
            actual: 9,
        };
        assert_eq!(err.to_string(), "Sum of shares 9 != amount 10");

        let err = SplitSettleError::InsufficientMembers { count: 1 };
        assert_eq!(err.to_string(), "Need at least 2 members, got 1");
    }

    #[test]
    fn test_external_errors() {
        assert!(SplitSettleError::Transfer("insufficient allowance".into()).is_external());
        assert!(!SplitSettleError::ArithmeticOverflow.is_external());
    }
}
