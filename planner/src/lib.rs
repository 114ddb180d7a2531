//! SplitSettle Planner
//!
//! Reads a group's debt entries, computes every member's net position and
//! produces a smaller edge set with the same net positions. The result is
//! bundled with its digest so a member can commit it and then apply it.

pub mod greedy;
pub mod proposal;

pub use greedy::{greedy_simplify, net_balances, NetBalance};
pub use proposal::SimplificationProposal;
