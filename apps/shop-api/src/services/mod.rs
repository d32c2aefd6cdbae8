//! Service layer.
//!
//! Handlers stay thin: they resolve identity and parse input, then hand
//! off to a service that owns the business flow.

pub mod order_service;

pub use order_service::OrderService;
