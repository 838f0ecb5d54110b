use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::sync::Mutex;
use uuid::Uuid;

use stocktrail_core::{ProductId, StoreId};
use stocktrail_inventory::aggregate_id;

use super::{ReadModel, ReadModelError, StockRecord};

/// JSON-file read model: a single map keyed `"<product_id>:<store_id>"`,
/// atomically swapped (temp file + rename) on every update.
///
/// Durable so that a restart serves queries without a full event replay; the
/// event log stays the authoritative truth and can rebuild this file.
#[derive(Debug)]
pub struct JsonFileReadModel {
    dir: PathBuf,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileReadModel {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ReadModelError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("inventory.json");
        Ok(Self {
            dir,
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn load_map(&self) -> Result<BTreeMap<String, StockRecord>, ReadModelError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_map(&self, map: &BTreeMap<String, StockRecord>) -> Result<(), ReadModelError> {
        let tmp = self.dir.join(format!("inventory.json.tmp-{}", Uuid::now_v7()));
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadModel for JsonFileReadModel {
    async fn update(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        available: u64,
        reserved: u64,
    ) -> Result<(), ReadModelError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load_map().await?;
        map.insert(
            aggregate_id(product_id, store_id),
            StockRecord::new(product_id, store_id, available, reserved),
        );
        self.save_map(&map).await
    }

    async fn get(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<StockRecord>, ReadModelError> {
        let map = self.load_map().await?;
        Ok(map.get(&aggregate_id(product_id, store_id)).cloned())
    }

    async fn get_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, ReadModelError> {
        let map = self.load_map().await?;
        Ok(map
            .into_values()
            .filter(|record| record.product_id == product_id)
            .collect())
    }

    async fn check(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        required: u64,
    ) -> Result<bool, ReadModelError> {
        Ok(self
            .get(product_id, store_id)
            .await?
            .map(|record| record.available >= required)
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, JsonFileReadModel) {
        let dir = tempfile::tempdir().unwrap();
        let rm = JsonFileReadModel::new(dir.path()).unwrap();
        (dir, rm)
    }

    #[tokio::test]
    async fn update_then_get_returns_the_record() {
        let (_dir, rm) = setup();
        let p = ProductId::new();
        let s = StoreId::new();

        rm.update(p, s, 90, 10).await.unwrap();

        let record = rm.get(p, s).await.unwrap().unwrap();
        assert_eq!(record.available, 90);
        assert_eq!(record.reserved, 10);
        assert_eq!(record.total, 100);
    }

    #[tokio::test]
    async fn update_overwrites_in_full() {
        let (_dir, rm) = setup();
        let p = ProductId::new();
        let s = StoreId::new();

        rm.update(p, s, 100, 0).await.unwrap();
        rm.update(p, s, 40, 5).await.unwrap();

        let record = rm.get(p, s).await.unwrap().unwrap();
        assert_eq!((record.available, record.reserved, record.total), (40, 5, 45));
    }

    #[tokio::test]
    async fn get_by_product_spans_stores() {
        let (_dir, rm) = setup();
        let p = ProductId::new();
        let s1 = StoreId::new();
        let s2 = StoreId::new();
        let other = ProductId::new();

        rm.update(p, s1, 10, 0).await.unwrap();
        rm.update(p, s2, 20, 0).await.unwrap();
        rm.update(other, s1, 99, 0).await.unwrap();

        let records = rm.get_by_product(p).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.product_id == p));
    }

    #[tokio::test]
    async fn check_compares_against_available_only() {
        let (_dir, rm) = setup();
        let p = ProductId::new();
        let s = StoreId::new();

        rm.update(p, s, 10, 90).await.unwrap();

        assert!(rm.check(p, s, 10).await.unwrap());
        assert!(!rm.check(p, s, 11).await.unwrap());
        assert!(!rm.check(ProductId::new(), s, 1).await.unwrap());
    }

    #[tokio::test]
    async fn records_survive_a_new_instance() {
        let (dir, rm) = setup();
        let p = ProductId::new();
        let s = StoreId::new();
        rm.update(p, s, 7, 0).await.unwrap();
        drop(rm);

        let reopened = JsonFileReadModel::new(dir.path()).unwrap();
        assert!(reopened.get(p, s).await.unwrap().is_some());
    }
}
