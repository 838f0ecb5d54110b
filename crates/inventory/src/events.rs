use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktrail_core::{CustomerId, EventId, OrderId, ProductId, ReservationId, StoreId};
use stocktrail_events::DomainEvent;

/// Event: stock was added to an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdded {
    pub event_id: EventId,
    pub aggregate_id: String,
    pub timestamp: DateTime<Utc>,
    pub version: u64,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub quantity: u64,
    pub reason: String,
}

/// Event: stock was reserved for a customer.
///
/// Carries `expires_at` so that replay reconstructs open reservations
/// faithfully, including their expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReserved {
    pub event_id: EventId,
    pub aggregate_id: String,
    pub timestamp: DateTime<Utc>,
    pub version: u64,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub customer_id: CustomerId,
    pub quantity: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Event: a reservation was committed (order completed, stock leaves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationCommitted {
    pub event_id: EventId,
    pub aggregate_id: String,
    pub timestamp: DateTime<Utc>,
    pub version: u64,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub order_id: OrderId,
    pub quantity: u64,
}

/// Event: a reservation was released (cancelled, stock returns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationReleased {
    pub event_id: EventId,
    pub aggregate_id: String,
    pub timestamp: DateTime<Utc>,
    pub version: u64,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub reason: String,
    pub quantity: u64,
}

/// Event: available stock was corrected to an absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub event_id: EventId,
    pub aggregate_id: String,
    pub timestamp: DateTime<Utc>,
    pub version: u64,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub old_quantity: u64,
    pub new_quantity: u64,
    pub reason: String,
}

/// All inventory events, tagged by `event_type` in the persisted record.
///
/// The serialized form is a flat JSON object: the tag plus the variant's
/// fields, which is exactly the on-disk event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum InventoryEvent {
    StockAdded(StockAdded),
    StockReserved(StockReserved),
    ReservationCommitted(ReservationCommitted),
    ReservationReleased(ReservationReleased),
    StockAdjusted(StockAdjusted),
}

impl InventoryEvent {
    pub fn product_id(&self) -> ProductId {
        match self {
            InventoryEvent::StockAdded(e) => e.product_id,
            InventoryEvent::StockReserved(e) => e.product_id,
            InventoryEvent::ReservationCommitted(e) => e.product_id,
            InventoryEvent::ReservationReleased(e) => e.product_id,
            InventoryEvent::StockAdjusted(e) => e.product_id,
        }
    }

    pub fn store_id(&self) -> StoreId {
        match self {
            InventoryEvent::StockAdded(e) => e.store_id,
            InventoryEvent::StockReserved(e) => e.store_id,
            InventoryEvent::ReservationCommitted(e) => e.store_id,
            InventoryEvent::ReservationReleased(e) => e.store_id,
            InventoryEvent::StockAdjusted(e) => e.store_id,
        }
    }
}

impl DomainEvent for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockAdded(_) => "StockAdded",
            InventoryEvent::StockReserved(_) => "StockReserved",
            InventoryEvent::ReservationCommitted(_) => "ReservationCommitted",
            InventoryEvent::ReservationReleased(_) => "ReservationReleased",
            InventoryEvent::StockAdjusted(_) => "StockAdjusted",
        }
    }

    fn event_id(&self) -> EventId {
        match self {
            InventoryEvent::StockAdded(e) => e.event_id,
            InventoryEvent::StockReserved(e) => e.event_id,
            InventoryEvent::ReservationCommitted(e) => e.event_id,
            InventoryEvent::ReservationReleased(e) => e.event_id,
            InventoryEvent::StockAdjusted(e) => e.event_id,
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            InventoryEvent::StockAdded(e) => &e.aggregate_id,
            InventoryEvent::StockReserved(e) => &e.aggregate_id,
            InventoryEvent::ReservationCommitted(e) => &e.aggregate_id,
            InventoryEvent::ReservationReleased(e) => &e.aggregate_id,
            InventoryEvent::StockAdjusted(e) => &e.aggregate_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::StockAdded(e) => e.timestamp,
            InventoryEvent::StockReserved(e) => e.timestamp,
            InventoryEvent::ReservationCommitted(e) => e.timestamp,
            InventoryEvent::ReservationReleased(e) => e.timestamp,
            InventoryEvent::StockAdjusted(e) => e.timestamp,
        }
    }

    fn version(&self) -> u64 {
        match self {
            InventoryEvent::StockAdded(e) => e.version,
            InventoryEvent::StockReserved(e) => e.version,
            InventoryEvent::ReservationCommitted(e) => e.version,
            InventoryEvent::ReservationReleased(e) => e.version,
            InventoryEvent::StockAdjusted(e) => e.version,
        }
    }
}
