//! # Inventory & Pricing Lookup
//!
//! Resolves product ids to their authoritative name, price and stock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderService                                                           │
//! │       │  lookup(&[1, 2, 999])                                           │
//! │       ▼                                                                 │
//! │  InventoryLookup (trait)                                                │
//! │       │                                                                 │
//! │       ├── ProductRepository   SELECT … WHERE id IN (?, ?, ?)            │
//! │       └── test doubles        stale or fixed snapshots                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { 1 → Headphone Bluetooth, 2 → Smartwatch Basic }   (999 absent)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing ids are simply absent from the map; callers detect them by set
//! difference. The lookup is read-only and its answer is advisory: the
//! order write re-checks stock inside its own transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use shop_core::{Money, ProductSnapshot};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;

/// Read-only lookup of current product name, price and stock.
#[async_trait]
pub trait InventoryLookup: Send + Sync {
    /// Returns a snapshot for every existing id in `product_ids`.
    ///
    /// No ordering guarantee. An empty input yields an empty map.
    async fn lookup(&self, product_ids: &[i64]) -> DbResult<HashMap<i64, ProductSnapshot>>;
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: i64,
    name: String,
    price_cents: i64,
    stock: i64,
}

impl From<SnapshotRow> for ProductSnapshot {
    fn from(row: SnapshotRow) -> Self {
        ProductSnapshot {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            stock: row.stock,
        }
    }
}

#[async_trait]
impl InventoryLookup for ProductRepository {
    async fn lookup(&self, product_ids: &[i64]) -> DbResult<HashMap<i64, ProductSnapshot>> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(ids = ?product_ids, "Looking up inventory");

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, price_cents, stock FROM products WHERE id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in product_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let rows: Vec<SnapshotRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id, ProductSnapshot::from(row)))
            .collect())
    }
}
