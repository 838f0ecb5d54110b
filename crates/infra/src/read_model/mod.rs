//! Denormalized (product, store) stock view — the CQRS read side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocktrail_core::{ProductId, StoreId};

mod in_memory;
mod json_file;

pub use in_memory::InMemoryReadModel;
pub use json_file::JsonFileReadModel;

/// One denormalized stock record, overwritten in full on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub available: u64,
    pub reserved: u64,
    pub total: u64,
}

impl StockRecord {
    pub fn new(product_id: ProductId, store_id: StoreId, available: u64, reserved: u64) -> Self {
        Self {
            product_id,
            store_id,
            available,
            reserved,
            total: available + reserved,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadModelError {
    #[error("read model io: {0}")]
    Io(#[from] std::io::Error),

    #[error("read model encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Read-model repository. Updated by command handlers after a successful
/// append; queries return a snapshot and may trail the event log briefly.
#[async_trait]
pub trait ReadModel: Send + Sync {
    /// Full overwrite of the (product, store) record; `total` is recomputed.
    async fn update(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        available: u64,
        reserved: u64,
    ) -> Result<(), ReadModelError>;

    async fn get(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<StockRecord>, ReadModelError>;

    /// Every store's record for one product.
    async fn get_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, ReadModelError>;

    /// Whether at least `required` units are available.
    async fn check(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        required: u64,
    ) -> Result<bool, ReadModelError>;
}
