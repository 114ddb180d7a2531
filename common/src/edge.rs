//! Simplified edges and their canonical encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::identifiers::decode_hex;
use crate::{Address, Amount, ParseHexError};

/// Width of an edge-set digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// One payment of a simplified edge set: `debtor` owes `creditor` `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimplifiedEdge {
    pub debtor: Address,
    pub creditor: Address,
    pub amount: Amount,
}

impl SimplifiedEdge {
    /// Create an edge.
    pub fn new(debtor: Address, creditor: Address, amount: Amount) -> Self {
        Self {
            debtor,
            creditor,
            amount,
        }
    }

    /// Append this edge's canonical bytes to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.debtor.as_bytes());
        out.extend_from_slice(self.creditor.as_bytes());
        out.extend_from_slice(&self.amount.to_be_bytes());
    }
}

/// Canonical, order-sensitive encoding of an edge sequence.
///
/// Layout: edge count as `u64` big-endian, then for every edge the debtor
/// bytes, the creditor bytes and the amount as 16 big-endian bytes.
pub fn encode_edges(edges: &[SimplifiedEdge]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + edges.len() * EDGE_ENCODED_LEN);
    out.extend_from_slice(&(edges.len() as u64).to_be_bytes());
    for edge in edges {
        edge.encode_into(&mut out);
    }
    out
}

const EDGE_ENCODED_LEN: usize = 20 + 20 + 16;

/// Content digest binding a specific edge sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeDigest([u8; DIGEST_LEN]);

impl EdgeDigest {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex form without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for EdgeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for EdgeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeDigest({})", self)
    }
}

impl From<[u8; DIGEST_LEN]> for EdgeDigest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for EdgeDigest {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex(s).map(Self)
    }
}

impl Serialize for EdgeDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EdgeDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(d: u64, c: u64, amount: Amount) -> SimplifiedEdge {
        SimplifiedEdge::new(Address::from_low_u64(d), Address::from_low_u64(c), amount)
    }

    #[test]
    fn test_encoding_layout() {
        let encoded = encode_edges(&[edge(1, 2, 5)]);

        assert_eq!(encoded.len(), 8 + EDGE_ENCODED_LEN);
        assert_eq!(&encoded[..8], &1u64.to_be_bytes());
        assert_eq!(encoded[8 + 19], 1);
        assert_eq!(encoded[8 + 39], 2);
        assert_eq!(encoded[encoded.len() - 1], 5);
    }

    #[test]
    fn test_encoding_is_order_sensitive() {
        let a = encode_edges(&[edge(1, 2, 5), edge(2, 3, 1)]);
        let b = encode_edges(&[edge(2, 3, 1), edge(1, 2, 5)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_encoding_is_count_only() {
        assert_eq!(encode_edges(&[]), 0u64.to_be_bytes().to_vec());
    }

    #[test]
    fn test_digest_hex_parse() {
        let digest = EdgeDigest::new([0xab; DIGEST_LEN]);
        let parsed: EdgeDigest = digest.to_string().parse().unwrap();
        assert_eq!(parsed, digest);
        assert!("0xabcd".parse::<EdgeDigest>().is_err());
    }

    #[test]
    fn test_digest_parses_like_address() {
        let digest = EdgeDigest::new([0xab; DIGEST_LEN]);
        let upper = format!("0X{}", digest.to_hex());
        assert_eq!(upper.parse::<EdgeDigest>().unwrap(), digest);

        // Length is reported before bad characters, as for addresses.
        assert_eq!(
            "0Xzz".parse::<EdgeDigest>(),
            Err(ParseHexError::InvalidLength {
                expected: 64,
                actual: 2
            })
        );

        let mut bad = "0".repeat(64);
        bad.replace_range(10..11, "g");
        assert_eq!(
            bad.parse::<EdgeDigest>(),
            Err(ParseHexError::InvalidCharacter(10))
        );
    }
}
