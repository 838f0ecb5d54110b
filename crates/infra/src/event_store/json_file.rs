use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as TokioMutex;
use uuid::Uuid;

use stocktrail_events::DomainEvent;
use stocktrail_inventory::InventoryEvent;

use super::{EventStore, EventStoreError};

/// JSON-file event store: one append-only file per aggregate.
///
/// Files live at `<dir>/<aggregate id with ':' replaced by '_'>.json` and hold
/// the ordered array of event records. Writes go through a temp file in the
/// same directory followed by an atomic rename, so a crash mid-write leaves
/// either the old log or the new log on disk, never a prefix of the new tail.
#[derive(Debug)]
pub struct JsonFileEventStore {
    dir: PathBuf,
    locks: StdMutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl JsonFileEventStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, EventStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: StdMutex::new(HashMap::new()),
        })
    }

    fn stream_lock(&self, aggregate_id: &str) -> Arc<TokioMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(aggregate_id.to_string())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone()
    }

    fn stream_path(&self, aggregate_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", aggregate_id.replace(':', "_")))
    }

    async fn read_stream(&self, aggregate_id: &str) -> Result<Vec<InventoryEvent>, EventStoreError> {
        match tokio::fs::read(self.stream_path(aggregate_id)).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_stream(
        &self,
        aggregate_id: &str,
        stream: &[InventoryEvent],
    ) -> Result<(), EventStoreError> {
        let path = self.stream_path(aggregate_id);
        let tmp = self.dir.join(format!(
            "{}.json.tmp-{}",
            aggregate_id.replace(':', "_"),
            Uuid::now_v7()
        ));

        let bytes = serde_json::to_vec_pretty(stream)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventStore for JsonFileEventStore {
    async fn append(
        &self,
        aggregate_id: &str,
        events: &[InventoryEvent],
        expected_version: u64,
    ) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let lock = self.stream_lock(aggregate_id);
        let _guard = lock.lock().await;

        let mut stream = self.read_stream(aggregate_id).await?;
        let current = stream.len() as u64;
        if current != expected_version {
            return Err(EventStoreError::Concurrency {
                expected: expected_version,
                found: current,
            });
        }

        stream.extend_from_slice(events);
        self.write_stream(aggregate_id, &stream).await
    }

    async fn load(
        &self,
        aggregate_id: &str,
        from_version: u64,
    ) -> Result<Vec<InventoryEvent>, EventStoreError> {
        let stream = self.read_stream(aggregate_id).await?;
        Ok(stream
            .into_iter()
            .filter(|e| e.version() > from_version)
            .collect())
    }

    async fn current_version(&self, aggregate_id: &str) -> Result<u64, EventStoreError> {
        Ok(self.read_stream(aggregate_id).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stocktrail_core::{EventId, ProductId, StoreId};
    use stocktrail_inventory::{aggregate_id, StockAdded};

    fn stock_added(agg: &str, product_id: ProductId, store_id: StoreId, version: u64) -> InventoryEvent {
        InventoryEvent::StockAdded(StockAdded {
            event_id: EventId::new(),
            aggregate_id: agg.to_string(),
            timestamp: Utc::now(),
            version,
            product_id,
            store_id,
            quantity: 10,
            reason: "restock".to_string(),
        })
    }

    fn setup() -> (tempfile::TempDir, JsonFileEventStore, String, ProductId, StoreId) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileEventStore::new(dir.path()).unwrap();
        let product_id = ProductId::new();
        let store_id = StoreId::new();
        let agg = aggregate_id(product_id, store_id);
        (dir, store, agg, product_id, store_id)
    }

    #[tokio::test]
    async fn append_then_load_round_trips() {
        let (_dir, store, agg, p, s) = setup();

        let events = vec![stock_added(&agg, p, s, 1), stock_added(&agg, p, s, 2)];
        store.append(&agg, &events, 0).await.unwrap();

        let loaded = store.load(&agg, 0).await.unwrap();
        assert_eq!(loaded, events);
        assert_eq!(store.current_version(&agg).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn load_unknown_aggregate_is_empty() {
        let (_dir, store, agg, _p, _s) = setup();
        assert!(store.load(&agg, 0).await.unwrap().is_empty());
        assert_eq!(store.current_version(&agg).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stale_expected_version_is_rejected() {
        let (_dir, store, agg, p, s) = setup();
        store.append(&agg, &[stock_added(&agg, p, s, 1)], 0).await.unwrap();

        let err = store
            .append(&agg, &[stock_added(&agg, p, s, 2)], 0)
            .await
            .unwrap_err();
        match err {
            EventStoreError::Concurrency { expected: 0, found: 1 } => {}
            other => panic!("expected Concurrency, got {other:?}"),
        }

        // The rejected append left the log untouched.
        assert_eq!(store.current_version(&agg).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn load_filters_by_from_version() {
        let (_dir, store, agg, p, s) = setup();
        let events = vec![
            stock_added(&agg, p, s, 1),
            stock_added(&agg, p, s, 2),
            stock_added(&agg, p, s, 3),
        ];
        store.append(&agg, &events, 0).await.unwrap();

        let tail = store.load(&agg, 1).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0], events[1]);
    }

    #[tokio::test]
    async fn appends_survive_a_new_store_instance() {
        let (dir, store, agg, p, s) = setup();
        store.append(&agg, &[stock_added(&agg, p, s, 1)], 0).await.unwrap();
        drop(store);

        let reopened = JsonFileEventStore::new(dir.path()).unwrap();
        assert_eq!(reopened.current_version(&agg).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn leftover_temp_file_does_not_corrupt_the_stream() {
        let (dir, store, agg, p, s) = setup();
        store.append(&agg, &[stock_added(&agg, p, s, 1)], 0).await.unwrap();

        // Simulate a crash that left a half-written temp file behind.
        let orphan = dir
            .path()
            .join(format!("{}.json.tmp-crashed", agg.replace(':', "_")));
        std::fs::write(&orphan, b"[{\"event_type\":\"Stock").unwrap();

        assert_eq!(store.load(&agg, 0).await.unwrap().len(), 1);
        store.append(&agg, &[stock_added(&agg, p, s, 2)], 1).await.unwrap();
        assert_eq!(store.current_version(&agg).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_serialize_per_aggregate() {
        let (_dir, store, agg, p, s) = setup();
        let store = std::sync::Arc::new(store);

        // Writers race; each retries with a freshly observed version until the
        // append lands. Afterwards the log must be the contiguous range 1..=N.
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let agg = agg.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    let current = store.current_version(&agg).await.unwrap();
                    let event = stock_added(&agg, p, s, current + 1);
                    match store.append(&agg, &[event], current).await {
                        Ok(()) => break,
                        Err(EventStoreError::Concurrency { .. }) => continue,
                        Err(other) => panic!("unexpected error: {other:?}"),
                    }
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let versions: Vec<u64> = store
            .load(&agg, 0)
            .await
            .unwrap()
            .iter()
            .map(|e| e.version())
            .collect();
        assert_eq!(versions, (1..=8).collect::<Vec<u64>>());
    }
}
