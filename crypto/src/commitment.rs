//! Edge-set commitments.

use splitsettle_common::{encode_edges, EdgeDigest, SimplifiedEdge};

use crate::hash::sha256;

/// Digest of an ordered edge sequence.
///
/// SHA-256 over the canonical encoding from [`encode_edges`]; reordering,
/// adding, removing or changing any edge yields a different digest.
pub fn edge_set_digest(edges: &[SimplifiedEdge]) -> EdgeDigest {
    EdgeDigest::new(sha256(&encode_edges(edges)))
}

/// Check that `edges` hash to `expected`.
pub fn matches_digest(edges: &[SimplifiedEdge], expected: &EdgeDigest) -> bool {
    edge_set_digest(edges) == *expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitsettle_common::Address;

    fn edge(d: u64, c: u64, amount: u128) -> SimplifiedEdge {
        SimplifiedEdge::new(Address::from_low_u64(d), Address::from_low_u64(c), amount)
    }

    #[test]
    fn test_digest_is_hash_of_encoding() {
        let edges = vec![edge(1, 2, 2)];
        assert_eq!(
            edge_set_digest(&edges).as_bytes(),
            &sha256(&encode_edges(&edges))
        );
    }

    #[test]
    fn test_empty_edge_set_digest() {
        assert_eq!(
            edge_set_digest(&[]).to_hex(),
            hex::encode(sha256(&0u64.to_be_bytes()))
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let edges = vec![edge(1, 2, 2), edge(3, 2, 7)];
        assert_eq!(edge_set_digest(&edges), edge_set_digest(&edges.clone()));
    }

    #[test]
    fn test_digest_binds_amounts_and_order() {
        let base = edge_set_digest(&[edge(1, 2, 2), edge(3, 2, 7)]);

        assert_ne!(base, edge_set_digest(&[edge(1, 2, 3), edge(3, 2, 7)]));
        assert_ne!(base, edge_set_digest(&[edge(3, 2, 7), edge(1, 2, 2)]));
        assert_ne!(base, edge_set_digest(&[edge(1, 2, 2)]));
    }

    #[test]
    fn test_matches_digest() {
        let edges = vec![edge(1, 2, 2)];
        let digest = edge_set_digest(&edges);

        assert!(matches_digest(&edges, &digest));
        assert!(!matches_digest(&[edge(2, 1, 2)], &digest));
    }
}
