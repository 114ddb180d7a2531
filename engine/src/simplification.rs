//! Commit/reveal protocol for replacing a group's debts.
//!
//! Each group has one commitment slot:
//!
//! ```text
//! NoPendingCommit --commit(d)--> Committed(d) --apply(E), hash(E) == d--> NoPendingCommit
//!                                Committed(d) --commit(d')-------------> Committed(d')
//! ```
//!
//! A commit always overwrites the slot (last writer wins). An apply whose
//! payload was committed by an overtaken member fails with `DigestMismatch`
//! and that member must commit again.

use std::collections::HashMap;

use serde::Serialize;

use splitsettle_common::{
    Address, EdgeDigest, GroupId, Result, SimplifiedEdge, SplitSettleError,
};
use splitsettle_crypto::edge_set_digest;

/// State of one group's commitment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommitmentSlot {
    /// Nothing committed, or the last commitment was applied.
    NoPendingCommit,
    /// A digest awaits its reveal.
    Committed {
        digest: EdgeDigest,
        committer: Address,
    },
}

impl CommitmentSlot {
    /// Pending digest, if any.
    pub fn digest(&self) -> Option<&EdgeDigest> {
        match self {
            CommitmentSlot::NoPendingCommit => None,
            CommitmentSlot::Committed { digest, .. } => Some(digest),
        }
    }

    /// Whether a commitment is pending.
    pub fn is_pending(&self) -> bool {
        matches!(self, CommitmentSlot::Committed { .. })
    }
}

/// Commitment slots for every group. Missing slots are `NoPendingCommit`.
#[derive(Debug, Clone, Default)]
pub struct CommitmentBook {
    slots: HashMap<GroupId, CommitmentSlot>,
}

impl CommitmentBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current slot of a group.
    pub fn slot(&self, group_id: GroupId) -> CommitmentSlot {
        self.slots
            .get(&group_id)
            .copied()
            .unwrap_or(CommitmentSlot::NoPendingCommit)
    }

    /// Store a commitment, returning the slot it replaced.
    pub fn commit(
        &mut self,
        group_id: GroupId,
        digest: EdgeDigest,
        committer: Address,
    ) -> CommitmentSlot {
        self.slots
            .insert(group_id, CommitmentSlot::Committed { digest, committer })
            .unwrap_or(CommitmentSlot::NoPendingCommit)
    }

    /// Check a reveal against the supplied and the stored digest.
    ///
    /// Returns the recomputed digest when `edges` hash to both.
    pub fn verify_reveal(
        &self,
        group_id: GroupId,
        edges: &[SimplifiedEdge],
        supplied: &EdgeDigest,
    ) -> Result<EdgeDigest> {
        let computed = edge_set_digest(edges);
        let stored = self.slot(group_id);

        let matches_stored = stored.digest() == Some(&computed);
        if computed != *supplied || !matches_stored {
            return Err(SplitSettleError::DigestMismatch { group_id, computed });
        }

        Ok(computed)
    }

    /// Reset a group's slot after a successful apply.
    pub fn consume(&mut self, group_id: GroupId) -> CommitmentSlot {
        self.slots
            .remove(&group_id)
            .unwrap_or(CommitmentSlot::NoPendingCommit)
    }
}

/// Reject edges that would store a debt from an address to itself.
pub fn validate_edges(edges: &[SimplifiedEdge]) -> Result<()> {
    match edges.iter().find(|e| e.debtor == e.creditor) {
        Some(edge) => Err(SplitSettleError::SelfDebt(edge.debtor)),
        None => Ok(()),
    }
}
