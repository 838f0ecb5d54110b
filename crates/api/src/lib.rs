//! HTTP adapter: thin Axum surface over the inventory service.

pub mod app;
