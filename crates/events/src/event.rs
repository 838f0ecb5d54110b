use chrono::{DateTime, Utc};

use stocktrail_core::EventId;

/// A domain-agnostic event trait for event-sourced aggregates.
///
/// Events represent **facts that happened** in the domain. They are immutable,
/// carry their own metadata, and are designed to be append-only: state is
/// rebuilt by replaying them in stored order.
///
/// ## Design constraints
///
/// Events must be:
/// - **Serializable**: events are serialized to JSON for storage
/// - **Cloneable**: events are copied when rebuilding aggregates and fanning out
/// - **Send + Sync + 'static**: events cross task boundaries (bus, handlers)
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event tag (e.g. "StockAdded").
    ///
    /// Used for bus topic routing and as the discriminant in the persisted
    /// record. Must never change once events with this tag have been stored.
    fn event_type(&self) -> &'static str;

    /// Unique identifier of this event instance.
    fn event_id(&self) -> EventId;

    /// Textual identifier of the aggregate stream this event belongs to.
    fn aggregate_id(&self) -> &str;

    /// When the event occurred (UTC).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Aggregate version after this event was applied.
    ///
    /// Versions in a stream form the contiguous sequence 1..N.
    fn version(&self) -> u64;
}
