//! # Order Service
//!
//! The order transaction engine: validation, inventory pre-check and the
//! atomic write, with bounded retry on lock contention.
//!
//! ## Checkout Flow
//! ```text
//! CheckoutRequest
//!      │
//!      ▼
//! ┌──────────────────────┐  IdentityRequired / InvalidAddress /
//! │ checkout::validate   │─ EmptyOrder / InvalidQuantity ──────────► 422
//! └──────────┬───────────┘
//!            │            ┌──────────────────────── retry loop ─────────┐
//!            ▼            │                                             │
//! ┌──────────────────────┐│  ProductNotFound / InsufficientStock        │
//! │ InventoryLookup      ││─────────────────────────────────────► 400   │
//! │ + check_inventory    ││                                             │
//! └──────────┬───────────┘│                                             │
//!            ▼            │                                             │
//! ┌──────────────────────┐│  stale lookup: same errors, from the        │
//! │ place_order (tx)     ││  conditional decrement ─────────────► 400   │
//! │ decrement + insert   ││                                             │
//! └──────────┬───────────┘│  Busy / PoolExhausted ──► backoff, again ───┘
//!            │            └─────────────────────────────────────────────┘
//!            ▼                 attempts exhausted / other store error ► 500
//!          Order
//! ```
//!
//! The lookup only fails fast; the conditional `UPDATE` inside the
//! transaction is what actually guards stock.

use std::sync::Arc;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use shop_core::checkout::{self, CheckoutRequest, ValidatedCheckout};
use shop_core::{Email, Order, OrderError, OrderOwner};
use shop_db::{DbError, InventoryLookup, OrderRepository, PlaceOrderError};
use tracing::{debug, error, info, warn};

use crate::config::CheckoutConfig;

/// Creates and lists orders.
#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    inventory: Arc<dyn InventoryLookup>,
    retry: CheckoutConfig,
}

impl OrderService {
    /// Create a new order service.
    pub fn new(
        orders: OrderRepository,
        inventory: Arc<dyn InventoryLookup>,
        retry: CheckoutConfig,
    ) -> Self {
        OrderService {
            orders,
            inventory,
            retry,
        }
    }

    /// Validates, prices and persists an order.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The committed order, built from the values written
    /// * `Err(OrderError)` - Client input, state conflict, or
    ///   `OrderCreationFailed` once the store gave up
    pub async fn create_order(&self, request: &CheckoutRequest) -> Result<Order, OrderError> {
        let checkout = checkout::validate(request)?;

        let mut backoff = self.create_backoff();
        let mut attempt: u32 = 1;

        loop {
            match self.attempt(&checkout).await {
                Ok(order) => {
                    info!(order_id = order.id, attempt, "Checkout complete");
                    return Ok(order);
                }
                Err(PlaceOrderError::Rejected(err)) => {
                    debug!(code = err.code(), "Checkout rejected");
                    return Err(err);
                }
                Err(PlaceOrderError::Db(err))
                    if err.is_transient() && attempt < self.retry.max_attempts =>
                {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.retry.max_backoff());
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Checkout hit store contention, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(PlaceOrderError::Db(err)) => {
                    error!(attempt, error = %err, "Checkout failed");
                    return Err(OrderError::OrderCreationFailed);
                }
            }
        }
    }

    /// One validate-and-mutate pass.
    async fn attempt(&self, checkout: &ValidatedCheckout) -> Result<Order, PlaceOrderError> {
        let snapshots = self.inventory.lookup(&checkout.product_ids()).await?;
        checkout.check_inventory(&snapshots)?;
        // Surfaces total overflow before the transaction opens
        checkout.price(&snapshots)?;

        self.orders.place_order(checkout).await
    }

    /// Orders of the requester, newest first.
    ///
    /// A user identity wins over `email`. A malformed email cannot own any
    /// order, so it yields an empty list.
    pub async fn list_orders(
        &self,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> Result<Vec<Order>, ListOrdersError> {
        let owner = match (user_id, email.map(str::trim)) {
            (Some(id), _) => OrderOwner::User(id),
            (None, Some(raw)) if !raw.is_empty() => match Email::parse(raw) {
                Ok(email) => OrderOwner::Guest(email),
                Err(_) => return Ok(Vec::new()),
            },
            _ => return Err(OrderError::AuthenticationRequired.into()),
        };

        Ok(self.orders.list_for_owner(&owner).await?)
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.retry.initial_backoff(),
            max_interval: self.retry.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None, // Bounded by max_attempts instead
            ..Default::default()
        }
    }
}

/// Failure listing orders.
#[derive(Debug, thiserror::Error)]
pub enum ListOrdersError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Db(#[from] DbError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use shop_core::checkout::LineRequest;
    use shop_core::{Money, ProductSnapshot};
    use shop_db::{Database, DbConfig, DbResult, NewProduct, ProductRepository};

    /// Fails the first `failures` lookups, then answers from the catalog.
    struct FlakyLookup {
        products: ProductRepository,
        failures: u32,
        error: fn() -> DbError,
        calls: AtomicU32,
    }

    impl FlakyLookup {
        fn new(db: &Database, failures: u32, error: fn() -> DbError) -> Arc<Self> {
            Arc::new(FlakyLookup {
                products: db.products(),
                failures,
                error,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InventoryLookup for FlakyLookup {
        async fn lookup(&self, product_ids: &[i64]) -> DbResult<HashMap<i64, ProductSnapshot>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)());
            }
            self.products.lookup(product_ids).await
        }
    }

    fn busy() -> DbError {
        DbError::Busy("database is locked".to_string())
    }

    fn quick_retry(max_attempts: u32) -> CheckoutConfig {
        CheckoutConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    fn flaky_service(db: &Database, lookup: Arc<FlakyLookup>, max_attempts: u32) -> OrderService {
        OrderService::new(db.orders(), lookup, quick_retry(max_attempts))
    }

    async fn setup(stock: i64) -> (Database, OrderService, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = db
            .products()
            .insert(&NewProduct {
                name: "Headphone Bluetooth".to_string(),
                description: None,
                price: Money::from_major_minor(299_000, 0),
                image_url: None,
                stock,
                category_id: None,
            })
            .await
            .unwrap();

        let service = OrderService::new(
            db.orders(),
            Arc::new(db.products()),
            CheckoutConfig::default(),
        );
        (db, service, id)
    }

    fn guest_request(product_id: i64, quantity: i64) -> CheckoutRequest {
        CheckoutRequest {
            user_id: None,
            guest_email: Some("guest@example.com".to_string()),
            shipping_address: "Jl. Merdeka No. 1".to_string(),
            items: vec![LineRequest { product_id, quantity }],
        }
    }

    #[tokio::test]
    async fn test_create_order_decrements_stock() {
        let (db, service, id) = setup(50).await;

        let order = service.create_order(&guest_request(id, 2)).await.unwrap();

        assert_eq!(order.total_amount, Money::from_major_minor(598_000, 0));
        assert_eq!(db.products().get_by_id(id).await.unwrap().unwrap().stock, 48);
    }

    #[tokio::test]
    async fn test_validation_failure_touches_nothing() {
        let (db, service, id) = setup(50).await;
        let mut request = guest_request(id, 2);
        request.shipping_address = "abc".to_string();

        assert_eq!(
            service.create_order(&request).await,
            Err(OrderError::InvalidAddress { min: 5 })
        );
        assert_eq!(db.products().get_by_id(id).await.unwrap().unwrap().stock, 50);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (db, _, id) = setup(50).await;
        let lookup = FlakyLookup::new(&db, 2, busy);
        let service = flaky_service(&db, lookup.clone(), 3);

        let order = service.create_order(&guest_request(id, 2)).await.unwrap();

        assert_eq!(order.lines[0].quantity, 2);
        assert_eq!(lookup.calls(), 3);
        assert_eq!(db.products().get_by_id(id).await.unwrap().unwrap().stock, 48);
        assert_eq!(service.list_orders(None, Some("guest@example.com")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let (db, _, id) = setup(50).await;
        let lookup = FlakyLookup::new(&db, 3, busy);
        let service = flaky_service(&db, lookup.clone(), 3);

        assert_eq!(
            service.create_order(&guest_request(id, 2)).await,
            Err(OrderError::OrderCreationFailed)
        );
        assert_eq!(lookup.calls(), 3);
        assert_eq!(db.products().get_by_id(id).await.unwrap().unwrap().stock, 50);
        assert!(service.list_orders(None, Some("guest@example.com")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_store_error_is_not_retried() {
        let (db, _, id) = setup(50).await;
        let lookup = FlakyLookup::new(&db, 1, || DbError::QueryFailed("no such table: products".to_string()));
        let service = flaky_service(&db, lookup.clone(), 3);

        assert_eq!(
            service.create_order(&guest_request(id, 2)).await,
            Err(OrderError::OrderCreationFailed)
        );
        assert_eq!(lookup.calls(), 1);
        assert_eq!(db.products().get_by_id(id).await.unwrap().unwrap().stock, 50);
    }

    #[tokio::test]
    async fn test_list_orders_requires_identity() {
        let (_db, service, _) = setup(5).await;

        for email in [None, Some(""), Some("   ")] {
            assert!(matches!(
                service.list_orders(None, email).await,
                Err(ListOrdersError::Order(OrderError::AuthenticationRequired))
            ));
        }
    }

    #[tokio::test]
    async fn test_list_orders_for_guest() {
        let (_db, service, id) = setup(5).await;
        service.create_order(&guest_request(id, 1)).await.unwrap();
        service.create_order(&guest_request(id, 2)).await.unwrap();

        let orders = service.list_orders(None, Some("guest@example.com")).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].id > orders[1].id);

        assert!(service.list_orders(None, Some("other@example.com")).await.unwrap().is_empty());
        assert!(service.list_orders(None, Some("not-an-email")).await.unwrap().is_empty());
    }
}
