use std::collections::HashMap;
use std::sync::RwLock;

use stocktrail_events::DomainEvent;
use stocktrail_inventory::InventoryEvent;

use super::{EventStore, EventStoreError};

/// In-memory append-only event store.
///
/// Intended for tests/dev. Same contract as the file-backed store, without
/// durability.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Vec<InventoryEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        aggregate_id: &str,
        events: &[InventoryEvent],
        expected_version: u64,
    ) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut streams = self.streams.write().unwrap_or_else(|e| e.into_inner());
        let stream = streams.entry(aggregate_id.to_string()).or_default();

        let current = stream.len() as u64;
        if current != expected_version {
            return Err(EventStoreError::Concurrency {
                expected: expected_version,
                found: current,
            });
        }

        stream.extend_from_slice(events);
        Ok(())
    }

    async fn load(
        &self,
        aggregate_id: &str,
        from_version: u64,
    ) -> Result<Vec<InventoryEvent>, EventStoreError> {
        let streams = self.streams.read().unwrap_or_else(|e| e.into_inner());
        Ok(streams
            .get(aggregate_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|e| e.version() > from_version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn current_version(&self, aggregate_id: &str) -> Result<u64, EventStoreError> {
        let streams = self.streams.read().unwrap_or_else(|e| e.into_inner());
        Ok(streams.get(aggregate_id).map(|s| s.len() as u64).unwrap_or(0))
    }
}
