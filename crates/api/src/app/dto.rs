use serde::{Deserialize, Serialize};

use stocktrail_core::{CustomerId, OrderId, ProductId, ReservationId, StoreId};
use stocktrail_infra::read_model::StockRecord;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub quantity: i64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ReserveStockRequest {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub quantity: i64,
    pub customer_id: CustomerId,
    /// Reservation time-to-live; 1..=1440, defaults to 30.
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CommitReservationRequest {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseReservationRequest {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reservation_id: ReservationId,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityRequest {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub required_quantity: i64,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub available: u64,
    pub reserved: u64,
    pub total: u64,
}

impl From<StockRecord> for StockResponse {
    fn from(record: StockRecord) -> Self {
        Self {
            available: record.available,
            reserved: record.reserved,
            total: record.total,
        }
    }
}
