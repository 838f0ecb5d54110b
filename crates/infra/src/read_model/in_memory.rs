use std::collections::HashMap;
use std::sync::RwLock;

use stocktrail_core::{ProductId, StoreId};
use stocktrail_inventory::aggregate_id;

use super::{ReadModel, ReadModelError, StockRecord};

/// In-memory read model for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReadModel {
    records: RwLock<HashMap<String, StockRecord>>,
}

impl InMemoryReadModel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ReadModel for InMemoryReadModel {
    async fn update(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        available: u64,
        reserved: u64,
    ) -> Result<(), ReadModelError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(
            aggregate_id(product_id, store_id),
            StockRecord::new(product_id, store_id, available, reserved),
        );
        Ok(())
    }

    async fn get(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<StockRecord>, ReadModelError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(&aggregate_id(product_id, store_id)).cloned())
    }

    async fn get_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, ReadModelError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .values()
            .filter(|record| record.product_id == product_id)
            .cloned()
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
