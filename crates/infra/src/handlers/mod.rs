//! Command and query handlers: the application pipeline over the stores.

use thiserror::Error;

use stocktrail_core::DomainError;

use crate::event_store::EventStoreError;
use crate::read_model::ReadModelError;

pub mod commands;
pub mod queries;

pub use commands::{
    AddStockCommand, AddStockHandler, CommitReservationCommand, CommitReservationHandler,
    ReleaseReservationCommand, ReleaseReservationHandler, ReserveStockCommand, ReserveStockHandler,
};
pub use queries::{
    product_inventory_key, stock_key, AvailabilityResult, CachedView, CheckAvailabilityHandler,
    GetProductInventoryHandler, GetStockHandler, StockCache,
};

/// Failure of a command or query.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error(transparent)]
    ReadModel(#[from] ReadModelError),
}

impl ServiceError {
    /// Version conflicts are the one retryable failure.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, ServiceError::Store(EventStoreError::Concurrency { .. }))
    }
}
