//! SplitSettle Cryptographic Primitives
//!
//! Provides the content hash used by the simplification commit/reveal
//! protocol. Callers commit to [`edge_set_digest`] of an edge sequence and
//! later reveal the sequence itself; the core recomputes the digest and
//! compares.

pub mod hash;
pub mod commitment;

pub use hash::sha256;
pub use commitment::{edge_set_digest, matches_digest};
