//! Query handlers: cache-aside reads over the denormalized projection.

use std::sync::Arc;

use serde::Serialize;

use stocktrail_core::{ProductId, StoreId};

use super::ServiceError;
use crate::cache::TtlCache;
use crate::read_model::{ReadModel, StockRecord};

/// What the query side caches: either one (product, store) record or a
/// product-wide view.
#[derive(Debug, Clone)]
pub enum CachedView {
    Stock(StockRecord),
    Product(Vec<StockRecord>),
}

pub type StockCache = TtlCache<CachedView>;

pub fn stock_key(product_id: ProductId, store_id: StoreId) -> String {
    format!("stock:{product_id}:{store_id}")
}

pub fn product_inventory_key(product_id: ProductId) -> String {
    format!("product_inventory:{product_id}")
}

/// Cache-aside lookup of one (product, store) record.
#[derive(Debug)]
pub struct GetStockHandler<R> {
    read_model: Arc<R>,
    cache: Arc<StockCache>,
}

impl<R: ReadModel> GetStockHandler<R> {
    pub fn new(read_model: Arc<R>, cache: Arc<StockCache>) -> Self {
        Self { read_model, cache }
    }

    pub async fn handle(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<StockRecord>, ServiceError> {
        let key = stock_key(product_id, store_id);

        if let Some(CachedView::Stock(record)) = self.cache.get(&key) {
            return Ok(Some(record));
        }

        let record = self.read_model.get(product_id, store_id).await?;
        if let Some(record) = &record {
            self.cache.set(key, CachedView::Stock(record.clone()), None);
        }

        Ok(record)
    }
}

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub current_stock: u64,
    pub required: u64,
}

/// Threshold check straight against the projection (no cache).
#[derive(Debug)]
pub struct CheckAvailabilityHandler<R> {
    read_model: Arc<R>,
}

impl<R: ReadModel> CheckAvailabilityHandler<R> {
    pub fn new(read_model: Arc<R>) -> Self {
        Self { read_model }
    }

    pub async fn handle(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        required: u64,
    ) -> Result<AvailabilityResult, ServiceError> {
        match self.read_model.get(product_id, store_id).await? {
            None => Ok(AvailabilityResult {
                available: false,
                current_stock: 0,
                required,
            }),
            Some(stock) => Ok(AvailabilityResult {
                available: stock.available >= required,
                current_stock: stock.available,
                required,
            }),
        }
    }
}

/// Cache-aside scan of a product's records across stores.
#[derive(Debug)]
pub struct GetProductInventoryHandler<R> {
    read_model: Arc<R>,
    cache: Arc<StockCache>,
}

impl<R: ReadModel> GetProductInventoryHandler<R> {
    pub fn new(read_model: Arc<R>, cache: Arc<StockCache>) -> Self {
        Self { read_model, cache }
    }

    pub async fn handle(&self, product_id: ProductId) -> Result<Vec<StockRecord>, ServiceError> {
        let key = product_inventory_key(product_id);

        if let Some(CachedView::Product(records)) = self.cache.get(&key) {
            return Ok(records);
        }

        let records = self.read_model.get_by_product(product_id).await?;
        if !records.is_empty() {
            self.cache.set(key, CachedView::Product(records.clone()), None);
        }

        Ok(records)
    }
}
