//! # Repository Module
//!
//! Database repository implementations for Mini Shop.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / OrderService                                           │
//! │       │                                                                 │
//! │       │  db.orders().place_order(&checkout)                            │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── place_order(&self, checkout)   ← one transaction                  │
//! │  ├── list_for_owner(&self, owner)                                      │
//! │  └── get_by_id(&self, id)                                              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog reads, implements [`inventory::InventoryLookup`]
//! - [`category::CategoryRepository`] - Categories
//! - [`user::UserRepository`] - Registered users
//! - [`order::OrderRepository`] - Transactional order write, order history

pub mod category;
pub mod inventory;
pub mod order;
pub mod product;
pub mod user;
