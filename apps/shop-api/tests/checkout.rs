//! Order engine behaviour against a real SQLite file.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shop_api::config::CheckoutConfig;
use shop_api::OrderService;
use shop_core::{Money, OrderError, OrderOwner, ProductSnapshot};
use shop_db::{DbResult, InventoryLookup, ProductRepository};

use common::{add_product, guest_checkout, shop, shop_with, stock_of, GUEST_EMAIL};

#[tokio::test]
async fn test_guest_checkout_totals_and_decrements() {
    let shop = shop().await;
    let headphone = add_product(&shop.db, "Headphone Bluetooth", 299_000, 50).await;

    let order = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(headphone, 2)]))
        .await
        .unwrap();

    assert_eq!(order.total_amount.to_string(), "598000.00");
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].unit_price, Money::from_major_minor(299_000, 0));
    assert_eq!(order.lines[0].name, "Headphone Bluetooth");
    assert_eq!(order.owner.guest_email().map(|e| e.as_str()), Some(GUEST_EMAIL));
    assert_eq!(stock_of(&shop.db, headphone).await, 48);
}

#[tokio::test]
async fn test_multi_line_order_decrements_each_product() {
    let shop = shop().await;
    let watch = add_product(&shop.db, "Smartwatch Basic", 499_000, 35).await;
    let shirt = add_product(&shop.db, "Kemeja Pria Slim Fit", 159_000, 120).await;

    let order = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(watch, 1), (shirt, 3)]))
        .await
        .unwrap();

    assert_eq!(order.total_amount, Money::from_major_minor(499_000 + 3 * 159_000, 0));
    assert_eq!(
        order.lines.iter().map(|l| l.product_id).collect::<Vec<_>>(),
        vec![watch, shirt]
    );
    assert_eq!(stock_of(&shop.db, watch).await, 34);
    assert_eq!(stock_of(&shop.db, shirt).await, 117);
}

#[tokio::test]
async fn test_user_identity_wins_over_guest_email() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Gaun Kasual", 199_000, 70).await;
    let email = shop_core::Email::parse("demo@local.test").unwrap();
    let user = shop.db.users().create(&email, "hash", "Demo User").await.unwrap();

    let mut request = guest_checkout(&[(product, 1)]);
    request.user_id = Some(user.id);

    let order = shop.state.orders.create_order(&request).await.unwrap();
    assert_eq!(order.owner, OrderOwner::User(user.id));

    let mine = shop.state.orders.list_orders(Some(user.id), None).await.unwrap();
    assert_eq!(mine.len(), 1);
    let guest = shop.state.orders.list_orders(None, Some(GUEST_EMAIL)).await.unwrap();
    assert!(guest.is_empty());
}

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Headphone Bluetooth", 299_000, 50).await;

    let mut request = guest_checkout(&[(product, 1)]);
    request.guest_email = None;

    assert_eq!(
        shop.state.orders.create_order(&request).await,
        Err(OrderError::IdentityRequired)
    );
    assert_eq!(stock_of(&shop.db, product).await, 50);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_stock_untouched() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Headphone Bluetooth", 299_000, 50).await;

    let err = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(product, 100)]))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OrderError::InsufficientStock {
            product_id: product,
            name: "Headphone Bluetooth".to_string(),
            available: 50,
            requested: 100,
        }
    );
    assert_eq!(stock_of(&shop.db, product).await, 50);
}

#[tokio::test]
async fn test_repeated_lines_are_summed_for_stock() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Set Pisau Dapur", 129_000, 50).await;

    let err = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(product, 30), (product, 30)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::InsufficientStock { available: 50, requested: 60, .. }
    ));
    assert_eq!(stock_of(&shop.db, product).await, 50);
}

#[tokio::test]
async fn test_unknown_product_rolls_back_everything() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Headphone Bluetooth", 299_000, 50).await;

    let err = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(product, 1), (9_999, 1)]))
        .await
        .unwrap_err();

    assert_eq!(err, OrderError::ProductNotFound { product_id: 9_999 });
    assert_eq!(stock_of(&shop.db, product).await, 50);
    assert!(shop
        .state
        .orders
        .list_orders(None, Some(GUEST_EMAIL))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_invalid_requests_mutate_nothing() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Headphone Bluetooth", 299_000, 50).await;

    let mut short_address = guest_checkout(&[(product, 1)]);
    short_address.shipping_address = " abc ".to_string();

    let mut bad_email = guest_checkout(&[(product, 1)]);
    bad_email.guest_email = Some("not-an-email".to_string());

    let cases = [
        (short_address, OrderError::InvalidAddress { min: 5 }),
        (bad_email, OrderError::IdentityRequired),
        (guest_checkout(&[]), OrderError::EmptyOrder),
        (
            guest_checkout(&[(product, 1), (product, 0)]),
            OrderError::InvalidQuantity { product_id: product, quantity: 0 },
        ),
        (
            guest_checkout(&[(product, -2)]),
            OrderError::InvalidQuantity { product_id: product, quantity: -2 },
        ),
    ];

    for (request, expected) in cases {
        assert_eq!(shop.state.orders.create_order(&request).await, Err(expected));
    }

    assert_eq!(stock_of(&shop.db, product).await, 50);
    assert!(shop
        .state
        .orders
        .list_orders(None, Some(GUEST_EMAIL))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_snapshot_price_survives_price_change() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Smartwatch Basic", 499_000, 35).await;

    let order = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(product, 2)]))
        .await
        .unwrap();

    shop.db
        .products()
        .update_price(product, Money::from_major_minor(549_000, 0))
        .await
        .unwrap();

    let listed = shop.state.orders.list_orders(None, Some(GUEST_EMAIL)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order.id);
    assert_eq!(listed[0].lines[0].unit_price, Money::from_major_minor(499_000, 0));
    assert_eq!(listed[0].total_amount, Money::from_major_minor(998_000, 0));

    // New orders pick up the new price
    let next = shop
        .state
        .orders
        .create_order(&guest_checkout(&[(product, 1)]))
        .await
        .unwrap();
    assert_eq!(next.total_amount, Money::from_major_minor(549_000, 0));
}

#[tokio::test]
async fn test_orders_listed_newest_first() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Headphone Bluetooth", 299_000, 50).await;

    let mut ids = Vec::new();
    for qty in 1..=3 {
        let order = shop
            .state
            .orders
            .create_order(&guest_checkout(&[(product, qty)]))
            .await
            .unwrap();
        ids.push(order.id);
    }
    ids.reverse();

    let listed = shop.state.orders.list_orders(None, Some(GUEST_EMAIL)).await.unwrap();
    assert_eq!(listed.iter().map(|o| o.id).collect::<Vec<_>>(), ids);
}

#[tokio::test]
async fn test_listing_requires_identity() {
    let shop = shop().await;
    assert!(shop.state.orders.list_orders(None, None).await.is_err());
    assert!(shop.state.orders.list_orders(None, Some(" ")).await.is_err());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_buyers_for_last_unit() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Headphone Bluetooth", 299_000, 1).await;

    let a = shop.state.orders.clone();
    let b = shop.state.orders.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.create_order(&guest_checkout(&[(product, 1)])).await }),
        tokio::spawn(async move { b.create_order(&guest_checkout(&[(product, 1)])).await }),
    );
    let results = [first.unwrap(), second.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let out_of_stock = results
        .iter()
        .filter(|r| matches!(r, Err(OrderError::InsufficientStock { .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(stock_of(&shop.db, product).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_never_oversell() {
    const BUYERS: usize = 20;
    const STOCK: i64 = 7;

    let shop = shop_with(
        8,
        CheckoutConfig {
            max_attempts: 5,
            ..CheckoutConfig::default()
        },
    )
    .await;
    let product = add_product(&shop.db, "Smartwatch Basic", 499_000, STOCK).await;

    let mut handles = Vec::with_capacity(BUYERS);
    for _ in 0..BUYERS {
        let orders = shop.state.orders.clone();
        handles.push(tokio::spawn(async move {
            orders.create_order(&guest_checkout(&[(product, 1)])).await
        }));
    }

    let mut successes = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.total_amount, Money::from_major_minor(499_000, 0));
                successes += 1;
            }
            Err(OrderError::InsufficientStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected checkout error: {other:?}"),
        }
    }

    assert_eq!(successes, STOCK as usize);
    assert_eq!(out_of_stock, BUYERS - STOCK as usize);
    assert_eq!(stock_of(&shop.db, product).await, 0);

    let orders = shop.state.orders.list_orders(None, Some(GUEST_EMAIL)).await.unwrap();
    assert_eq!(orders.len(), STOCK as usize);
}

// =============================================================================
// Stale lookup
// =============================================================================

/// Reports far more stock than the store holds.
struct StaleLookup {
    inner: ProductRepository,
}

#[async_trait]
impl InventoryLookup for StaleLookup {
    async fn lookup(&self, product_ids: &[i64]) -> DbResult<HashMap<i64, ProductSnapshot>> {
        let mut snapshots = self.inner.lookup(product_ids).await?;
        for snapshot in snapshots.values_mut() {
            snapshot.stock += 1_000;
        }
        Ok(snapshots)
    }
}

#[tokio::test]
async fn test_stale_lookup_is_caught_in_transaction() {
    let shop = shop().await;
    let product = add_product(&shop.db, "Gaun Kasual", 199_000, 3).await;

    let service = OrderService::new(
        shop.db.orders(),
        Arc::new(StaleLookup {
            inner: shop.db.products(),
        }),
        CheckoutConfig::default(),
    );

    let err = service
        .create_order(&guest_checkout(&[(product, 5)]))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OrderError::InsufficientStock {
            product_id: product,
            name: "Gaun Kasual".to_string(),
            available: 3,
            requested: 5,
        }
    );
    assert_eq!(stock_of(&shop.db, product).await, 3);

    // The real stock still sells
    let order = service.create_order(&guest_checkout(&[(product, 3)])).await.unwrap();
    assert_eq!(order.lines[0].quantity, 3);
    assert_eq!(stock_of(&shop.db, product).await, 0);
}
