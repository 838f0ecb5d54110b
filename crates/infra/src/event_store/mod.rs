//! Append-only event store with per-aggregate optimistic concurrency.

use async_trait::async_trait;
use thiserror::Error;

use stocktrail_inventory::InventoryEvent;

mod in_memory;
mod json_file;

pub use in_memory::InMemoryEventStore;
pub use json_file::JsonFileEventStore;

#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Optimistic concurrency check failed: reality moved on.
    #[error("version conflict: expected {expected}, found {found}")]
    Concurrency { expected: u64, found: u64 },

    #[error("event store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("event store encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Append-only, per-aggregate event log.
///
/// Implementations must:
/// - serialize writes to the same aggregate (per-aggregate mutex)
/// - reject an append whose `expected_version` does not equal the current
///   event count with [`EventStoreError::Concurrency`]
/// - make every successful append visible to subsequent loads from any caller,
///   with no torn tail after a crash (all-or-nothing per call)
///
/// Reads do not take the write mutex; they may observe the state between
/// atomic writes, never a partial one.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append `events` atomically, checking `expected_version` first.
    ///
    /// Callers stamp event versions as `expected_version+1 ..`; the store
    /// trusts that contract.
    async fn append(
        &self,
        aggregate_id: &str,
        events: &[InventoryEvent],
        expected_version: u64,
    ) -> Result<(), EventStoreError>;

    /// Every stored event with `version > from_version`, in stored order.
    async fn load(
        &self,
        aggregate_id: &str,
        from_version: u64,
    ) -> Result<Vec<InventoryEvent>, EventStoreError>;

    /// Current event count of the aggregate stream (0 for unknown streams).
    async fn current_version(&self, aggregate_id: &str) -> Result<u64, EventStoreError>;
}
