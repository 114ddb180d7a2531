//! SplitSettle Engine
//!
//! The engine keeps groups of addresses, records who owes whom when a member
//! pays a shared expense, lets members replace a group's debts with a
//! committed simplified edge set, and settles debts through an external
//! value ledger.

pub mod config;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod registry;
pub mod settlement;
pub mod simplification;
pub mod splitter;

pub use config::{EngineConfig, LimitsConfig};
pub use engine::SplitEngine;
pub use events::{EventEnvelope, EventFeed, LedgerEvent};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use registry::{Group, GroupRegistry};
pub use simplification::CommitmentSlot;
pub use splitter::SplitPlan;
