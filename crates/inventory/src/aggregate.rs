use std::collections::HashMap;

use chrono::{DateTime, Utc};

use stocktrail_core::{
    CustomerId, DomainError, DomainResult, EventId, OrderId, ProductId, Quantity, ReservationId,
    StoreId,
};

use crate::events::{
    InventoryEvent, ReservationCommitted, ReservationReleased, StockAdded, StockAdjusted,
    StockReserved,
};

/// Textual aggregate identifier: `"<product_id>:<store_id>"`.
///
/// UUID text never contains `:`, so the delimiter is unambiguous.
pub fn aggregate_id(product_id: ProductId, store_id: StoreId) -> String {
    format!("{product_id}:{store_id}")
}

/// A stock hold moving quantity from `available` to `reserved` until it is
/// committed or released.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: ReservationId,
    pub quantity: u64,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Expiration is observable but inert: nothing reaps expired reservations,
    /// and committing one succeeds.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

/// Aggregate root: inventory of one product at one store.
///
/// Mutating methods enforce the domain invariants, bump `version` once per
/// emitted event, and stage the event in `pending` until the command pipeline
/// drains it with [`Inventory::take_pending`].
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    product_id: ProductId,
    store_id: StoreId,
    available: Quantity,
    reserved: Quantity,
    version: u64,
    reservations: HashMap<ReservationId, Reservation>,
    pending: Vec<InventoryEvent>,
}

impl Inventory {
    /// Fresh aggregate with no history (lazy creation on first command).
    pub fn new(product_id: ProductId, store_id: StoreId) -> Self {
        Self {
            product_id,
            store_id,
            available: Quantity::zero(),
            reserved: Quantity::zero(),
            version: 0,
            reservations: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Rebuild state by replaying the full ordered event log.
    pub fn replay(product_id: ProductId, store_id: StoreId, events: &[InventoryEvent]) -> Self {
        let mut inventory = Self::new(product_id, store_id);
        for event in events {
            inventory.apply(event);
        }
        inventory
    }

    /// Apply a single historical event to derive state.
    ///
    /// Events from a well-formed log never underflow; a corrupt log saturates
    /// at zero rather than panicking.
    pub fn apply(&mut self, event: &InventoryEvent) {
        match event {
            InventoryEvent::StockAdded(e) => {
                self.available = Quantity::from(self.available.value().saturating_add(e.quantity));
                self.version = e.version;
            }
            InventoryEvent::StockReserved(e) => {
                self.reservations.insert(
                    e.reservation_id,
                    Reservation {
                        id: e.reservation_id,
                        quantity: e.quantity,
                        customer_id: e.customer_id,
                        created_at: e.timestamp,
                        expires_at: e.expires_at,
                    },
                );
                self.available = Quantity::from(self.available.value().saturating_sub(e.quantity));
                self.reserved = Quantity::from(self.reserved.value().saturating_add(e.quantity));
                self.version = e.version;
            }
            InventoryEvent::ReservationCommitted(e) => {
                self.reservations.remove(&e.reservation_id);
                self.reserved = Quantity::from(self.reserved.value().saturating_sub(e.quantity));
                self.version = e.version;
            }
            InventoryEvent::ReservationReleased(e) => {
                self.reservations.remove(&e.reservation_id);
                self.reserved = Quantity::from(self.reserved.value().saturating_sub(e.quantity));
                self.available = Quantity::from(self.available.value().saturating_add(e.quantity));
                self.version = e.version;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.available = Quantity::from(e.new_quantity);
                self.version = e.version;
            }
        }
    }

    /// Add stock. `quantity` must be positive.
    pub fn add_stock(&mut self, quantity: i64, reason: &str) -> DomainResult<()> {
        let delta = positive_quantity(quantity)?;
        self.available = self.available.add(delta)?;
        self.version += 1;

        self.pending.push(InventoryEvent::StockAdded(StockAdded {
            event_id: EventId::new(),
            aggregate_id: self.aggregate_id(),
            timestamp: Utc::now(),
            version: self.version,
            product_id: self.product_id,
            store_id: self.store_id,
            quantity: delta.value(),
            reason: reason.to_string(),
        }));

        Ok(())
    }

    /// Reserve stock for a customer. Fails when `quantity` exceeds `available`.
    pub fn reserve(
        &mut self,
        quantity: i64,
        customer_id: CustomerId,
        expires_at: Option<DateTime<Utc>>,
    ) -> DomainResult<ReservationId> {
        let delta = positive_quantity(quantity)?;

        if delta.value() > self.available.value() {
            return Err(DomainError::insufficient_stock(format!(
                "available={}, requested={}",
                self.available.value(),
                delta.value()
            )));
        }

        let reservation_id = ReservationId::new();
        let now = Utc::now();
        self.reservations.insert(
            reservation_id,
            Reservation {
                id: reservation_id,
                quantity: delta.value(),
                customer_id,
                created_at: now,
                expires_at,
            },
        );

        self.available = self.available.subtract(delta)?;
        self.reserved = self.reserved.add(delta)?;
        self.version += 1;

        self.pending.push(InventoryEvent::StockReserved(StockReserved {
            event_id: EventId::new(),
            aggregate_id: self.aggregate_id(),
            timestamp: now,
            version: self.version,
            product_id: self.product_id,
            store_id: self.store_id,
            reservation_id,
            customer_id,
            quantity: delta.value(),
            expires_at,
        }));

        Ok(reservation_id)
    }

    /// Commit a reservation: the held stock leaves the inventory for good.
    ///
    /// Succeeds even when the reservation has expired.
    pub fn commit(&mut self, reservation_id: ReservationId, order_id: OrderId) -> DomainResult<()> {
        let reservation = self
            .reservations
            .remove(&reservation_id)
            .ok_or_else(|| DomainError::reservation_not_found(reservation_id.to_string()))?;

        let delta = Quantity::from(reservation.quantity);
        self.reserved = self.reserved.subtract(delta)?;
        self.version += 1;

        self.pending
            .push(InventoryEvent::ReservationCommitted(ReservationCommitted {
                event_id: EventId::new(),
                aggregate_id: self.aggregate_id(),
                timestamp: Utc::now(),
                version: self.version,
                product_id: self.product_id,
                store_id: self.store_id,
                reservation_id,
                order_id,
                quantity: reservation.quantity,
            }));

        Ok(())
    }

    /// Release a reservation: the held stock returns to `available`.
    pub fn release(&mut self, reservation_id: ReservationId, reason: &str) -> DomainResult<()> {
        let reservation = self
            .reservations
            .remove(&reservation_id)
            .ok_or_else(|| DomainError::reservation_not_found(reservation_id.to_string()))?;

        let delta = Quantity::from(reservation.quantity);
        self.reserved = self.reserved.subtract(delta)?;
        self.available = self.available.add(delta)?;
        self.version += 1;

        self.pending
            .push(InventoryEvent::ReservationReleased(ReservationReleased {
                event_id: EventId::new(),
                aggregate_id: self.aggregate_id(),
                timestamp: Utc::now(),
                version: self.version,
                product_id: self.product_id,
                store_id: self.store_id,
                reservation_id,
                reason: reason.to_string(),
                quantity: reservation.quantity,
            }));

        Ok(())
    }

    /// Correct available stock to an absolute value. Leaves `reserved` alone.
    pub fn adjust(&mut self, new_quantity: i64, reason: &str) -> DomainResult<()> {
        let new_stock = Quantity::new(new_quantity)?;
        let old_quantity = self.available.value();
        self.available = new_stock;
        self.version += 1;

        self.pending.push(InventoryEvent::StockAdjusted(StockAdjusted {
            event_id: EventId::new(),
            aggregate_id: self.aggregate_id(),
            timestamp: Utc::now(),
            version: self.version,
            product_id: self.product_id,
            store_id: self.store_id,
            old_quantity,
            new_quantity: new_stock.value(),
            reason: reason.to_string(),
        }));

        Ok(())
    }

    /// Drain the staged events. Subsequent calls return nothing.
    pub fn take_pending(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn aggregate_id(&self) -> String {
        aggregate_id(self.product_id, self.store_id)
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn available(&self) -> Quantity {
        self.available
    }

    pub fn reserved(&self) -> Quantity {
        self.reserved
    }

    /// Total stock: available + reserved.
    pub fn total(&self) -> u64 {
        self.available.value() + self.reserved.value()
    }

    /// Monotonic version; equals the number of events ever applied.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn reservations(&self) -> &HashMap<ReservationId, Reservation> {
        &self.reservations
    }

    pub fn pending(&self) -> &[InventoryEvent] {
        &self.pending
    }
}

fn positive_quantity(quantity: i64) -> DomainResult<Quantity> {
    let q = Quantity::new(quantity)?;
    if q.is_zero() {
        return Err(DomainError::invalid_quantity("quantity must be positive"));
    }
    Ok(q)
}
