//! Simplification proposals ready for commit and apply.

use serde::Serialize;
use tracing::info;

use splitsettle_common::{checked_sum, Amount, EdgeDigest, GroupId, Result, SimplifiedEdge};
use splitsettle_crypto::{edge_set_digest, matches_digest};

use crate::greedy::greedy_simplify;

/// A simplified edge set for one group together with its digest.
///
/// The digest is what a member commits; the edges are what the same member
/// later reveals when applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimplificationProposal {
    pub group_id: GroupId,
    pub edges: Vec<SimplifiedEdge>,
    pub digest: EdgeDigest,
    /// Number of entries the proposal replaces.
    pub replaces: usize,
}

impl SimplificationProposal {
    /// Simplify a group's live entries.
    pub fn from_entries(group_id: GroupId, entries: &[SimplifiedEdge]) -> Result<Self> {
        let edges = greedy_simplify(entries)?;
        let proposal = Self::from_edges(group_id, edges, entries.len());

        info!(
            group_id = %group_id,
            before = entries.len(),
            after = proposal.edges.len(),
            digest = %proposal.digest,
            "Simplification proposed"
        );

        Ok(proposal)
    }

    /// Wrap an already computed edge set.
    pub fn from_edges(group_id: GroupId, edges: Vec<SimplifiedEdge>, replaces: usize) -> Self {
        let digest = edge_set_digest(&edges);
        Self {
            group_id,
            edges,
            digest,
            replaces,
        }
    }

    /// Whether the edges still hash to the stored digest.
    pub fn verify(&self) -> bool {
        matches_digest(&self.edges, &self.digest)
    }

    /// Total value the proposed edges carry.
    pub fn total(&self) -> Result<Amount> {
        checked_sum(self.edges.iter().map(|e| &e.amount))
    }

    /// Number of entries removed by applying the proposal.
    pub fn reduction(&self) -> usize {
        self.replaces.saturating_sub(self.edges.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitsettle_common::Address;

    fn edge(d: u64, c: u64, amount: Amount) -> SimplifiedEdge {
        SimplifiedEdge::new(Address::from_low_u64(d), Address::from_low_u64(c), amount)
    }

    #[test]
    fn test_proposal_digest_matches_edges() {
        let entries = [edge(1, 2, 5), edge(2, 3, 5), edge(3, 1, 1)];
        let proposal = SimplificationProposal::from_entries(GroupId::new(3), &entries).unwrap();

        assert_eq!(proposal.edges, vec![edge(1, 3, 4)]);
        assert_eq!(proposal.digest, edge_set_digest(&proposal.edges));
        assert!(proposal.verify());
        assert_eq!(proposal.total().unwrap(), 4);
        assert_eq!(proposal.reduction(), 2);
    }

    #[test]
    fn test_tampered_proposal_fails_verification() {
        let mut proposal =
            SimplificationProposal::from_entries(GroupId::new(0), &[edge(1, 2, 5)]).unwrap();
        proposal.edges[0].amount = 6;
        assert!(!proposal.verify());
    }

    #[test]
    fn test_empty_group_proposal() {
        let proposal = SimplificationProposal::from_entries(GroupId::new(0), &[]).unwrap();
        assert!(proposal.edges.is_empty());
        assert_eq!(proposal.digest, edge_set_digest(&[]));
    }

    #[test]
    fn test_proposal_serializes_digest_as_hex() {
        let proposal = SimplificationProposal::from_entries(GroupId::new(0), &[edge(1, 2, 5)]).unwrap();
        let json = serde_json::to_value(&proposal).unwrap();
        assert_eq!(json["digest"], proposal.digest.to_string());
    }
}
