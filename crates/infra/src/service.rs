//! Application service: commands with bounded retry, queries, and the cache
//! invalidation subscriptions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use stocktrail_core::{CustomerId, OrderId, ProductId, ReservationId, StoreId};
use stocktrail_events::{DomainEvent, EventBus, EventHandler};
use stocktrail_inventory::InventoryEvent;

use crate::event_store::EventStore;
use crate::handlers::{
    stock_key, AddStockCommand, AddStockHandler, AvailabilityResult,
    CheckAvailabilityHandler, CommitReservationCommand, CommitReservationHandler,
    GetProductInventoryHandler, GetStockHandler, ReleaseReservationCommand,
    ReleaseReservationHandler, ReserveStockCommand, ReserveStockHandler, ServiceError, StockCache,
};
use crate::read_model::{ReadModel, StockRecord};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Every event tag that mutates inventory; each one invalidates the cache.
const INVENTORY_TOPICS: [&str; 5] = [
    "StockAdded",
    "StockReserved",
    "ReservationCommitted",
    "ReservationReleased",
    "StockAdjusted",
];

/// Bus subscriber that drops cache entries touched by an event.
struct CacheInvalidator {
    cache: Arc<StockCache>,
}

#[async_trait]
impl EventHandler<InventoryEvent> for CacheInvalidator {
    async fn handle(&self, event: &InventoryEvent) -> anyhow::Result<()> {
        let product_id = event.product_id();
        let store_id = event.store_id();

        self.cache.delete(&stock_key(product_id, store_id));
        let pattern = Regex::new(&format!("^product_inventory:{product_id}$"))?;
        self.cache.invalidate_pattern(&pattern);

        tracing::info!(
            event_type = event.event_type(),
            %product_id,
            %store_id,
            "cache invalidated"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "cache-invalidator"
    }
}

/// Bounded retry around a command: version conflicts are retried with a small
/// backoff, everything else surfaces immediately.
async fn retry_on_conflict<T, Fut, F>(mut op: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Err(e) if e.is_concurrency_conflict() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(attempt, "version conflict, retrying command");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Facade over the command and query handlers.
///
/// All collaborators are constructor-injected; constructing the service also
/// wires the standard cache-invalidation subscriptions onto the bus.
#[derive(Debug)]
pub struct InventoryService<S, R> {
    add_stock: AddStockHandler<S, R>,
    reserve_stock: ReserveStockHandler<S, R>,
    commit_reservation: CommitReservationHandler<S, R>,
    release_reservation: ReleaseReservationHandler<S, R>,
    get_stock: GetStockHandler<R>,
    check_availability: CheckAvailabilityHandler<R>,
    get_product_inventory: GetProductInventoryHandler<R>,
    event_bus: Arc<EventBus<InventoryEvent>>,
    cache: Arc<StockCache>,
}

impl<S: EventStore, R: ReadModel> InventoryService<S, R> {
    pub fn new(
        event_store: Arc<S>,
        read_model: Arc<R>,
        event_bus: Arc<EventBus<InventoryEvent>>,
        cache: Arc<StockCache>,
    ) -> Self {
        let invalidator: Arc<dyn EventHandler<InventoryEvent>> = Arc::new(CacheInvalidator {
            cache: cache.clone(),
        });
        for topic in INVENTORY_TOPICS {
            event_bus.subscribe(topic, invalidator.clone());
        }

        Self {
            add_stock: AddStockHandler::new(
                event_store.clone(),
                read_model.clone(),
                event_bus.clone(),
            ),
            reserve_stock: ReserveStockHandler::new(
                event_store.clone(),
                read_model.clone(),
                event_bus.clone(),
            ),
            commit_reservation: CommitReservationHandler::new(
                event_store.clone(),
                read_model.clone(),
                event_bus.clone(),
            ),
            release_reservation: ReleaseReservationHandler::new(
                event_store,
                read_model.clone(),
                event_bus.clone(),
            ),
            get_stock: GetStockHandler::new(read_model.clone(), cache.clone()),
            check_availability: CheckAvailabilityHandler::new(read_model.clone()),
            get_product_inventory: GetProductInventoryHandler::new(read_model, cache.clone()),
            event_bus,
            cache,
        }
    }

    // Commands

    pub async fn add_stock(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        quantity: i64,
        reason: &str,
    ) -> Result<(), ServiceError> {
        let command = AddStockCommand {
            product_id,
            store_id,
            quantity,
            reason: reason.to_string(),
        };
        retry_on_conflict(|| self.add_stock.handle(command.clone())).await
    }

    pub async fn reserve_stock(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        quantity: i64,
        customer_id: CustomerId,
        ttl_minutes: Option<i64>,
    ) -> Result<ReservationId, ServiceError> {
        let command = ReserveStockCommand {
            product_id,
            store_id,
            quantity,
            customer_id,
            ttl_minutes,
        };
        retry_on_conflict(|| self.reserve_stock.handle(command.clone())).await
    }

    pub async fn commit_reservation(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        reservation_id: ReservationId,
        order_id: OrderId,
    ) -> Result<(), ServiceError> {
        let command = CommitReservationCommand {
            product_id,
            store_id,
            reservation_id,
            order_id,
        };
        retry_on_conflict(|| self.commit_reservation.handle(command.clone())).await
    }

    pub async fn release_reservation(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        reservation_id: ReservationId,
        reason: &str,
    ) -> Result<(), ServiceError> {
        let command = ReleaseReservationCommand {
            product_id,
            store_id,
            reservation_id,
            reason: reason.to_string(),
        };
        retry_on_conflict(|| self.release_reservation.handle(command.clone())).await
    }

    // Queries

    pub async fn get_stock(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<StockRecord>, ServiceError> {
        self.get_stock.handle(product_id, store_id).await
    }

    pub async fn check_availability(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        required: u64,
    ) -> Result<AvailabilityResult, ServiceError> {
        self.check_availability.handle(product_id, store_id, required).await
    }

    pub async fn get_product_inventory(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<StockRecord>, ServiceError> {
        self.get_product_inventory.handle(product_id).await
    }

    pub fn event_bus(&self) -> &Arc<EventBus<InventoryEvent>> {
        &self.event_bus
    }

    pub fn cache(&self) -> &Arc<StockCache> {
        &self.cache
    }
}
