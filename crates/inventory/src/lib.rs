//! Inventory domain: the per-(product, store) aggregate and its events.

pub mod aggregate;
pub mod events;

pub use aggregate::{aggregate_id, Inventory, Reservation};
pub use events::{
    InventoryEvent, ReservationCommitted, ReservationReleased, StockAdded, StockAdjusted,
    StockReserved,
};
