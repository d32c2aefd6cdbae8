//! # Order Repository
//!
//! The transactional order write and order history reads.
//!
//! ## Order Write Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place_order (one transaction)                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼  for each line, in request order:                                  │
//! │  UPDATE products SET stock = stock - qty                                │
//! │   WHERE id = ? AND stock >= qty          ◄── first statement is a write,│
//! │   RETURNING name, price_cents, stock         so the write lock is taken │
//! │    │                                         before anything is read    │
//! │    ├── no row? ──► SELECT name, stock ──► ProductNotFound               │
//! │    │                                   └► InsufficientStock ──► ROLLBACK│
//! │    ▼                                                                    │
//! │  price(snapshots from RETURNING)  → total                               │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  INSERT INTO orders … RETURNING id                                      │
//! │  INSERT INTO order_items … (snapshot price)                             │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT ──► Order built from the values written above                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional UPDATE is the stock check. Two concurrent checkouts can't
//! both pass it for the last unit: SQLite serialises writers, and the second
//! one sees the first one's decrement.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shop_core::checkout::ValidatedCheckout;
use shop_core::{Email, Money, Order, OrderError, OrderLine, OrderOwner, ProductSnapshot};
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult, PlaceOrderError};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    guest_email: Option<String>,
    shipping_address: String,
    total_amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> DbResult<Order> {
        let owner = match (self.user_id, self.guest_email) {
            (Some(user_id), _) => OrderOwner::User(user_id),
            (None, Some(email)) => OrderOwner::Guest(Email::parse(&email).map_err(|e| {
                DbError::Internal(format!("order {} has an invalid guest email: {}", self.id, e))
            })?),
            (None, None) => {
                return Err(DbError::Internal(format!("order {} has no owner", self.id)));
            }
        };

        Ok(Order {
            id: self.id,
            owner,
            shipping_address: self.shipping_address,
            total_amount: Money::from_cents(self.total_amount_cents),
            created_at: self.created_at,
            lines,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: i64,
    product_id: i64,
    name: String,
    quantity: i64,
    price_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct DecrementedRow {
    name: String,
    price_cents: i64,
    stock: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    name: String,
    stock: i64,
}

const ORDER_COLUMNS: &str =
    "SELECT id, user_id, guest_email, shipping_address, total_amount_cents, created_at FROM orders";

// Current product name, snapshot price.
const LINE_COLUMNS: &str = r#"
    SELECT oi.order_id, oi.product_id, p.name, oi.quantity, oi.price_cents
    FROM order_items oi
    JOIN products p ON p.id = oi.product_id
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Decrements stock, prices the order and persists it, atomically.
    ///
    /// ## Returns
    /// * `Ok(Order)` - Committed order, with snapshot prices
    /// * `Err(PlaceOrderError::Rejected)` - A product vanished or ran out;
    ///   nothing was written
    /// * `Err(PlaceOrderError::Db)` - Store failure; nothing was written.
    ///   Check [`DbError::is_transient`] before retrying
    pub async fn place_order(&self, checkout: &ValidatedCheckout) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        match Self::write_order(&mut tx, checkout).await {
            Ok(order) => {
                tx.commit().await?;
                info!(
                    order_id = order.id,
                    total = %order.total_amount,
                    lines = order.lines.len(),
                    "Order created"
                );
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed order write failed");
                }
                Err(err)
            }
        }
    }

    async fn write_order(
        tx: &mut Transaction<'static, Sqlite>,
        checkout: &ValidatedCheckout,
    ) -> Result<Order, PlaceOrderError> {
        let requested: HashMap<i64, i64> = checkout.requested_quantities().into_iter().collect();
        let mut decremented: HashMap<i64, i64> = HashMap::new();
        let mut snapshots: HashMap<i64, ProductSnapshot> = HashMap::new();

        for line in checkout.lines() {
            let row: Option<DecrementedRow> = sqlx::query_as(
                r#"
                UPDATE products
                SET stock = stock - ?1
                WHERE id = ?2 AND stock >= ?1
                RETURNING name, price_cents, stock
                "#,
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .fetch_optional(&mut **tx)
            .await?;

            let Some(row) = row else {
                let already_taken = decremented.get(&line.product_id).copied().unwrap_or(0);
                let total_requested = requested
                    .get(&line.product_id)
                    .copied()
                    .unwrap_or(line.quantity);
                return Err(Self::explain_failed_decrement(
                    tx,
                    line.product_id,
                    already_taken,
                    total_requested,
                )
                .await);
            };

            *decremented.entry(line.product_id).or_insert(0) += line.quantity;
            snapshots.insert(
                line.product_id,
                ProductSnapshot {
                    id: line.product_id,
                    name: row.name,
                    price: Money::from_cents(row.price_cents),
                    stock: row.stock,
                },
            );
        }

        let priced = checkout.price(&snapshots)?;
        let owner = checkout.owner();
        let created_at = Utc::now();

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, guest_email, shipping_address, total_amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(owner.user_id())
        .bind(owner.guest_email().map(Email::as_str))
        .bind(checkout.shipping_address())
        .bind(priced.total.cents())
        .bind(created_at)
        .fetch_one(&mut **tx)
        .await?;

        for line in &priced.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut **tx)
            .await?;
        }

        Ok(Order {
            id: order_id,
            owner: owner.clone(),
            shipping_address: checkout.shipping_address().to_string(),
            total_amount: priced.total,
            created_at,
            lines: priced.lines,
        })
    }

    /// Works out why a conditional decrement matched no row.
    async fn explain_failed_decrement(
        tx: &mut Transaction<'static, Sqlite>,
        product_id: i64,
        already_taken: i64,
        requested: i64,
    ) -> PlaceOrderError {
        let row: Result<Option<StockRow>, sqlx::Error> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await;

        match row {
            Ok(None) => OrderError::ProductNotFound { product_id }.into(),
            Ok(Some(row)) => {
                debug!(product_id = product_id, stock = row.stock, requested = requested, "Stock check failed");
                OrderError::InsufficientStock {
                    product_id,
                    name: row.name,
                    available: row.stock + already_taken,
                    requested,
                }
                .into()
            }
            Err(err) => err.into(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Orders of `owner`, newest first, each with its lines in insertion
    /// order.
    ///
    /// Lines show the product's current name next to the price it was
    /// bought at.
    pub async fn list_for_owner(&self, owner: &OrderOwner) -> DbResult<Vec<Order>> {
        let (filter, key) = owner_filter(owner);
        debug!(owner = ?owner, "Listing orders");

        let order_sql = format!("{ORDER_COLUMNS} WHERE {filter} ORDER BY id DESC");
        let orders: Vec<OrderRow> = key
            .bind_to(sqlx::query_as(&order_sql))
            .fetch_all(&self.pool)
            .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let line_sql = format!(
            "{LINE_COLUMNS} WHERE oi.order_id IN (SELECT id FROM orders WHERE {filter}) ORDER BY oi.id"
        );
        let line_rows: Vec<OrderLineRow> = key
            .bind_to(sqlx::query_as(&line_sql))
            .fetch_all(&self.pool)
            .await?;

        let mut lines_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            lines_by_order.entry(row.order_id).or_default().push(OrderLine {
                product_id: row.product_id,
                name: row.name,
                quantity: row.quantity,
                unit_price: Money::from_cents(row.price_cents),
            });
        }

        orders
            .into_iter()
            .map(|order| {
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                order.into_order(lines)
            })
            .collect()
    }

    /// Reads an order back with its lines.
    #[cfg(test)]
    pub(crate) async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let order_sql = format!("{ORDER_COLUMNS} WHERE id = ?1");
        let Some(order) = sqlx::query_as::<_, OrderRow>(&order_sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let line_sql = format!("{LINE_COLUMNS} WHERE oi.order_id = ?1 ORDER BY oi.id");
        let lines: Vec<OrderLine> = sqlx::query_as::<_, OrderLineRow>(&line_sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| OrderLine {
                product_id: row.product_id,
                name: row.name,
                quantity: row.quantity,
                unit_price: Money::from_cents(row.price_cents),
            })
            .collect();

        order.into_order(lines).map(Some)
    }
}

// =============================================================================
// Owner Filter
// =============================================================================

enum OwnerKey {
    User(i64),
    Guest(String),
}

impl OwnerKey {
    fn bind_to<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        match self {
            OwnerKey::User(id) => query.bind(*id),
            OwnerKey::Guest(email) => query.bind(email.clone()),
        }
    }
}

fn owner_filter(owner: &OrderOwner) -> (&'static str, OwnerKey) {
    match owner {
        OrderOwner::User(id) => ("user_id = ?1", OwnerKey::User(*id)),
        OrderOwner::Guest(email) => ("guest_email = ?1", OwnerKey::Guest(email.to_string())),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
