//! # Mini Shop API
//!
//! HTTP server for the catalog, customer accounts and order checkout.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shop API Server                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth routes   │  │ catalog routes │  │  order routes              ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • products     │  │ • POST /api/orders         ││
//! │  │ • login        │  │ • product/{id} │  │ • GET  /api/orders         ││
//! │  │                │  │ • categories   │  │                            ││
//! │  └───────┬────────┘  └───────┬────────┘  └─────────────┬──────────────┘│
//! │          │                   │                         │               │
//! │          │                   │              ┌──────────▼─────────┐     │
//! │          │                   │              │   OrderService     │     │
//! │          │                   │              │ validate → lookup  │     │
//! │          │                   │              │ → tx write (retry) │     │
//! │          │                   │              └──────────┬─────────┘     │
//! │  ┌───────▼───────────────────▼─────────────────────────▼──────────────┐│
//! │  │                     shop-db (SQLite, WAL)                          ││
//! │  └────────────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Environment variables use the `SHOP_` prefix:
//! - `SHOP_BIND_ADDRESS` - listen address (default: 0.0.0.0:8000)
//! - `SHOP_DATABASE_PATH` - SQLite file (default: shop.db)
//! - `SHOP_JWT_SECRET` - Secret for JWT signing
//! - `SHOP_JWT_LIFETIME_SECS` - Token lifetime (default: 604800)
//! - `SHOP_CHECKOUT__MAX_ATTEMPTS` - Checkout attempts under contention (default: 3)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use shop_db::Database;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;
pub use services::OrderService;

use crate::auth::JwtManager;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub orders: OrderService,
    pub jwt: JwtManager,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires the services over an open database.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let orders = OrderService::new(
            db.orders(),
            Arc::new(db.products()),
            config.checkout.clone(),
        );
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);

        AppState {
            db,
            orders,
            jwt,
            config: Arc::new(config),
        }
    }
}

/// The application router.
pub fn app(state: AppState) -> Router {
    routes::router(state)
}
