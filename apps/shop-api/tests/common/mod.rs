//! Shared fixtures for the integration tests.
//!
//! Every test gets its own SQLite file in a temp directory so that
//! concurrent checkouts run over real, separate connections.

#![allow(dead_code)]

use std::time::Duration;

use shop_api::config::CheckoutConfig;
use shop_api::{ApiConfig, AppState};
use shop_core::checkout::{CheckoutRequest, LineRequest};
use shop_core::Money;
use shop_db::{Database, DbConfig, NewProduct};
use tempfile::TempDir;

pub const GUEST_EMAIL: &str = "guest@example.com";
pub const ADDRESS: &str = "Jl. Merdeka No. 1, Jakarta";

/// A file-backed shop. Keep it alive for the whole test; dropping it
/// removes the database directory.
pub struct TestShop {
    pub dir: TempDir,
    pub db: Database,
    pub state: AppState,
}

pub async fn shop() -> TestShop {
    shop_with(8, CheckoutConfig::default()).await
}

pub async fn shop_with(max_connections: u32, checkout: CheckoutConfig) -> TestShop {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");

    let db = Database::new(
        DbConfig::new(&path)
            .max_connections(max_connections)
            .busy_timeout(Duration::from_secs(10)),
    )
    .await
    .unwrap();

    let config = ApiConfig {
        database_path: path.to_string_lossy().into_owned(),
        jwt_secret: "integration-test-secret".to_string(),
        checkout,
        ..ApiConfig::default()
    };
    let state = AppState::new(db.clone(), config);

    TestShop { dir, db, state }
}

pub async fn add_product(db: &Database, name: &str, price_major: i64, stock: i64) -> i64 {
    add_product_in(db, name, price_major, stock, None).await
}

pub async fn add_product_in(
    db: &Database,
    name: &str,
    price_major: i64,
    stock: i64,
    category_id: Option<i64>,
) -> i64 {
    db.products()
        .insert(&NewProduct {
            name: name.to_string(),
            description: None,
            price: Money::from_major_minor(price_major, 0),
            image_url: None,
            stock,
            category_id,
        })
        .await
        .unwrap()
}

pub async fn stock_of(db: &Database, product_id: i64) -> i64 {
    db.products().get_by_id(product_id).await.unwrap().unwrap().stock
}

pub fn guest_checkout(items: &[(i64, i64)]) -> CheckoutRequest {
    CheckoutRequest {
        user_id: None,
        guest_email: Some(GUEST_EMAIL.to_string()),
        shipping_address: ADDRESS.to_string(),
        items: items
            .iter()
            .map(|&(product_id, quantity)| LineRequest { product_id, quantity })
            .collect(),
    }
}
