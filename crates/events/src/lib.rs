//! Event abstractions: the domain event contract and the in-process bus.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventHandler};
pub use event::DomainEvent;
