//! # shop-core: Pure Business Logic for Mini Shop
//!
//! This crate holds the checkout rules of Mini Shop as pure functions with
//! zero I/O dependencies. Everything that touches SQLite lives in `shop-db`;
//! everything that speaks HTTP lives in `apps/shop-api`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mini Shop Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend (SPA)                           │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Order History              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shop-api (axum)                              │   │
//! │  │    POST /api/orders, GET /api/products, auth, ...               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shop-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│   │   │
//! │  │   │   Order   │  │   Money   │  │  validate │  │   rules   │   │   │
//! │  │   │ OrderLine │  │  Decimal  │  │   price   │  │   Email   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shop-db (Database Layer)                     │   │
//! │  │        SQLite queries, migrations, transactional order write    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderLine, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`email`] - Validated email addresses
//! - [`checkout`] - Checkout validation and pricing
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shop_core::checkout::{CheckoutRequest, LineRequest};
//!
//! let request = CheckoutRequest {
//!     user_id: None,
//!     guest_email: Some("guest@example.com".to_string()),
//!     shipping_address: "Jl. Merdeka No. 1".to_string(),
//!     items: vec![LineRequest { product_id: 1, quantity: 2 }],
//! };
//!
//! let checkout = shop_core::checkout::validate(&request).unwrap();
//! assert_eq!(checkout.product_ids(), vec![1]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod email;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use email::Email;
pub use error::{ErrorKind, OrderError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum length of a trimmed shipping address.
pub const MIN_SHIPPING_ADDRESS_LEN: usize = 5;

/// Catalog page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Upper bound on the catalog page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Minimum password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum display name length at registration.
pub const MIN_NAME_LEN: usize = 2;
