//! Ledger event feed.
//!
//! Every successful mutating call publishes one [`LedgerEvent`]. Delivery is
//! best effort: publishing with no subscribers, or to a lagging subscriber,
//! never fails the call that produced the event.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use splitsettle_common::{Address, Amount, EdgeDigest, GroupId, SplitStrategy};

/// A state change observed on the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    GroupCreated {
        group_id: GroupId,
        creator: Address,
        members: Vec<Address>,
    },
    MemberJoined {
        group_id: GroupId,
        member: Address,
        member_count: usize,
    },
    ExpenseRegistered {
        group_id: GroupId,
        payer: Address,
        amount: Amount,
        strategy: SplitStrategy,
        /// Number of debt increases recorded.
        increases: usize,
        /// Part of the amount recorded as nobody's debt.
        unassigned: Amount,
    },
    SimplificationCommitted {
        group_id: GroupId,
        committer: Address,
        digest: EdgeDigest,
        /// Digest this commit overwrote, if any.
        replaced: Option<EdgeDigest>,
    },
    SimplificationApplied {
        group_id: GroupId,
        applier: Address,
        digest: EdgeDigest,
        cleared: usize,
        edges: usize,
    },
    DebtSettled {
        group_id: GroupId,
        debtor: Address,
        creditor: Address,
        amount: Amount,
        remaining: Amount,
    },
}

impl LedgerEvent {
    /// Group the event belongs to.
    pub fn group_id(&self) -> GroupId {
        match self {
            LedgerEvent::GroupCreated { group_id, .. }
            | LedgerEvent::MemberJoined { group_id, .. }
            | LedgerEvent::ExpenseRegistered { group_id, .. }
            | LedgerEvent::SimplificationCommitted { group_id, .. }
            | LedgerEvent::SimplificationApplied { group_id, .. }
            | LedgerEvent::DebtSettled { group_id, .. } => *group_id,
        }
    }

    /// Short event name.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::GroupCreated { .. } => "group_created",
            LedgerEvent::MemberJoined { .. } => "member_joined",
            LedgerEvent::ExpenseRegistered { .. } => "expense_registered",
            LedgerEvent::SimplificationCommitted { .. } => "simplification_committed",
            LedgerEvent::SimplificationApplied { .. } => "simplification_applied",
            LedgerEvent::DebtSettled { .. } => "debt_settled",
        }
    }
}

/// An event with its delivery metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique, time-ordered event id.
    pub id: Uuid,
    /// Position in the engine's event stream, starting at 1.
    pub sequence: u64,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// The event itself.
    pub event: LedgerEvent,
}

/// Broadcast channel carrying [`EventEnvelope`]s.
pub struct EventFeed {
    sender: broadcast::Sender<EventEnvelope>,
    sequence: AtomicU64,
}

impl EventFeed {
    /// Create a feed buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Wrap and broadcast an event.
    pub fn publish(&self, event: LedgerEvent) -> EventEnvelope {
        let envelope = EventEnvelope {
            id: Uuid::now_v7(),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            timestamp: Utc::now(),
            event,
        };

        // No receivers is fine.
        let _ = self.sender.send(envelope.clone());
        envelope
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of events published so far.
    pub fn published(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(n: u64) -> LedgerEvent {
        LedgerEvent::MemberJoined {
            group_id: GroupId::new(0),
            member: Address::from_low_u64(n),
            member_count: 3,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = EventFeed::new(4);
        let envelope = feed.publish(joined(1));

        assert_eq!(envelope.sequence, 1);
        assert_eq!(feed.published(), 1);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let feed = EventFeed::new(4);
        let mut rx = feed.subscribe();

        feed.publish(joined(1));
        feed.publish(joined(2));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event, joined(1));
        assert_eq!(second.event, joined(2));
        assert!(first.sequence < second.sequence);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_does_not_block_publish() {
        let feed = EventFeed::new(1);
        let mut rx = feed.subscribe();

        feed.publish(joined(1));
        feed.publish(joined(2));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().event, joined(2));
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(joined(1)).unwrap();
        assert_eq!(json["type"], "member_joined");
        assert_eq!(json["member"], Address::from_low_u64(1).to_string());
        assert_eq!(joined(1).name(), "member_joined");
    }
}
