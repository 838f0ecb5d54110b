//! Command pipeline: load → replay → decide → append → project → publish.
//!
//! Each handler owns one command type. Domain errors surface before any I/O;
//! a version conflict at the append surfaces to the caller for retry.

use std::sync::Arc;

use chrono::{Duration, Utc};

use stocktrail_core::{CustomerId, OrderId, ProductId, ReservationId, StoreId};
use stocktrail_events::EventBus;
use stocktrail_inventory::{aggregate_id, Inventory, InventoryEvent};

use super::ServiceError;
use crate::event_store::EventStore;
use crate::read_model::ReadModel;

/// Command to add stock to an inventory.
#[derive(Debug, Clone)]
pub struct AddStockCommand {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub quantity: i64,
    pub reason: String,
}

/// Command to reserve stock for a customer.
#[derive(Debug, Clone)]
pub struct ReserveStockCommand {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub quantity: i64,
    pub customer_id: CustomerId,
    pub ttl_minutes: Option<i64>,
}

/// Command to commit a reservation (order completed).
#[derive(Debug, Clone)]
pub struct CommitReservationCommand {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub order_id: OrderId,
}

/// Command to release a reservation (cancelled).
#[derive(Debug, Clone)]
pub struct ReleaseReservationCommand {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub reason: String,
}

/// Rehydrate the aggregate from its full event stream (fresh if none).
async fn load_inventory<S: EventStore>(
    event_store: &S,
    product_id: ProductId,
    store_id: StoreId,
) -> Result<Inventory, ServiceError> {
    let id = aggregate_id(product_id, store_id);
    let history = event_store.load(&id, 0).await?;
    Ok(Inventory::replay(product_id, store_id, &history))
}

/// Steps 5–8 of the pipeline, shared by every command handler.
///
/// After a successful append the events are durable; a projection failure past
/// that point is logged and surfaced, and the read model trails until the next
/// successful update (or a rebuild from the log).
async fn persist_and_project<S: EventStore, R: ReadModel>(
    event_store: &S,
    read_model: &R,
    event_bus: &EventBus<InventoryEvent>,
    inventory: &mut Inventory,
) -> Result<(), ServiceError> {
    let new_events = inventory.take_pending();
    if new_events.is_empty() {
        return Ok(());
    }

    let id = inventory.aggregate_id();
    let expected_version = inventory.version() - new_events.len() as u64;
    event_store.append(&id, &new_events, expected_version).await?;

    if let Err(e) = read_model
        .update(
            inventory.product_id(),
            inventory.store_id(),
            inventory.available().value(),
            inventory.reserved().value(),
        )
        .await
    {
        tracing::error!(
            aggregate_id = %id,
            error = %e,
            "projection update failed after append; events remain authoritative"
        );
        return Err(e.into());
    }

    for event in &new_events {
        event_bus.publish(event).await;
    }

    Ok(())
}

/// Handler for [`AddStockCommand`].
#[derive(Debug)]
pub struct AddStockHandler<S, R> {
    event_store: Arc<S>,
    read_model: Arc<R>,
    event_bus: Arc<EventBus<InventoryEvent>>,
}

impl<S: EventStore, R: ReadModel> AddStockHandler<S, R> {
    pub fn new(
        event_store: Arc<S>,
        read_model: Arc<R>,
        event_bus: Arc<EventBus<InventoryEvent>>,
    ) -> Self {
        Self {
            event_store,
            read_model,
            event_bus,
        }
    }

    pub async fn handle(&self, command: AddStockCommand) -> Result<(), ServiceError> {
        let mut inventory =
            load_inventory(&*self.event_store, command.product_id, command.store_id).await?;
        inventory.add_stock(command.quantity, &command.reason)?;
        persist_and_project(
            &*self.event_store,
            &*self.read_model,
            &self.event_bus,
            &mut inventory,
        )
        .await
    }
}

/// Handler for [`ReserveStockCommand`].
#[derive(Debug)]
pub struct ReserveStockHandler<S, R> {
    event_store: Arc<S>,
    read_model: Arc<R>,
    event_bus: Arc<EventBus<InventoryEvent>>,
}

impl<S: EventStore, R: ReadModel> ReserveStockHandler<S, R> {
    pub fn new(
        event_store: Arc<S>,
        read_model: Arc<R>,
        event_bus: Arc<EventBus<InventoryEvent>>,
    ) -> Self {
        Self {
            event_store,
            read_model,
            event_bus,
        }
    }

    pub async fn handle(&self, command: ReserveStockCommand) -> Result<ReservationId, ServiceError> {
        let mut inventory =
            load_inventory(&*self.event_store, command.product_id, command.store_id).await?;

        let expires_at = command.ttl_minutes.map(|m| Utc::now() + Duration::minutes(m));
        let reservation_id = inventory.reserve(command.quantity, command.customer_id, expires_at)?;

        persist_and_project(
            &*self.event_store,
            &*self.read_model,
            &self.event_bus,
            &mut inventory,
        )
        .await?;

        Ok(reservation_id)
    }
}

/// Handler for [`CommitReservationCommand`].
#[derive(Debug)]
pub struct CommitReservationHandler<S, R> {
    event_store: Arc<S>,
    read_model: Arc<R>,
    event_bus: Arc<EventBus<InventoryEvent>>,
}

impl<S: EventStore, R: ReadModel> CommitReservationHandler<S, R> {
    pub fn new(
        event_store: Arc<S>,
        read_model: Arc<R>,
        event_bus: Arc<EventBus<InventoryEvent>>,
    ) -> Self {
        Self {
            event_store,
            read_model,
            event_bus,
        }
    }

    pub async fn handle(&self, command: CommitReservationCommand) -> Result<(), ServiceError> {
        let mut inventory =
            load_inventory(&*self.event_store, command.product_id, command.store_id).await?;
        inventory.commit(command.reservation_id, command.order_id)?;
        persist_and_project(
            &*self.event_store,
            &*self.read_model,
            &self.event_bus,
            &mut inventory,
        )
        .await
    }
}

/// Handler for [`ReleaseReservationCommand`].
#[derive(Debug)]
pub struct ReleaseReservationHandler<S, R> {
    event_store: Arc<S>,
    read_model: Arc<R>,
    event_bus: Arc<EventBus<InventoryEvent>>,
}

impl<S: EventStore, R: ReadModel> ReleaseReservationHandler<S, R> {
    pub fn new(
        event_store: Arc<S>,
        read_model: Arc<R>,
        event_bus: Arc<EventBus<InventoryEvent>>,
    ) -> Self {
        Self {
            event_store,
            read_model,
            event_bus,
        }
    }

    pub async fn handle(&self, command: ReleaseReservationCommand) -> Result<(), ServiceError> {
        let mut inventory =
            load_inventory(&*self.event_store, command.product_id, command.store_id).await?;
        inventory.release(command.reservation_id, &command.reason)?;
        persist_and_project(
            &*self.event_store,
            &*self.read_model,
            &self.event_bus,
            &mut inventory,
        )
        .await
    }
}
