//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Filtered, sorted, paginated catalog listing
//! - Lookup by id
//! - Inserts and price changes (seed data, back-office tooling, tests)
//! - [`InventoryLookup`](super::inventory::InventoryLookup) for checkout
//!
//! ## Catalog Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/products?category_id=1&price_min=100000&sort=price_asc&q=watch│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductQuery ──► push_filters()  (shared by COUNT and SELECT)          │
//! │       │                                                                 │
//! │       │   WHERE p.category_id = ?                                       │
//! │       │     AND p.price_cents >= ?                                      │
//! │       │     AND LOWER(p.name) LIKE ? ESCAPE '\'                         │
//! │       ▼                                                                 │
//! │  ORDER BY p.price_cents ASC, p.id DESC   LIMIT ? OFFSET ?               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductPage { items, total }                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog reads never mutate stock. Stock changes only through
//! [`OrderRepository::place_order`](super::order::OrderRepository::place_order).

use shop_core::{Category, Money, Product, ProductSort};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Rows & Queries
// =============================================================================

/// A product row joined with its (optional) category.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub stock: i64,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };

        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            image_url: row.image_url,
            stock: row.stock,
            category,
        }
    }
}

const PRODUCT_COLUMNS: &str = r#"
    SELECT
        p.id,
        p.name,
        p.description,
        p.price_cents,
        p.image_url,
        p.stock,
        c.id AS category_id,
        c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Catalog listing parameters, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category_id: Option<i64>,
    pub price_min: Option<Money>,
    pub price_max: Option<Money>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub sort: ProductSort,
    /// 1-based.
    pub page: i64,
    pub page_size: i64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            category_id: None,
            price_min: None,
            price_max: None,
            search: None,
            sort: ProductSort::Newest,
            page: 1,
            page_size: shop_core::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of catalog results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
}

/// Fields for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i64,
    pub category_id: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pub(crate) pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching `query`, one page at a time.
    ///
    /// Default ordering is newest first (id descending); price sorts break
    /// ties by id descending so pages are stable.
    pub async fn list(&self, query: &ProductQuery) -> DbResult<ProductPage> {
        debug!(
            category_id = ?query.category_id,
            search = ?query.search,
            sort = ?query.sort,
            page = query.page,
            page_size = query.page_size,
            "Listing products"
        );

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
        push_filters(&mut select, query);
        select.push(match query.sort {
            ProductSort::Newest => " ORDER BY p.id DESC",
            ProductSort::PriceAsc => " ORDER BY p.price_cents ASC, p.id DESC",
            ProductSort::PriceDesc => " ORDER BY p.price_cents DESC, p.id DESC",
        });

        let offset = (query.page - 1).saturating_mul(query.page_size);
        select.push(" LIMIT ");
        select.push_bind(query.page_size);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let rows: Vec<ProductRow> = select.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), total = total, "Listing returned products");
        Ok(ProductPage {
            items: rows.into_iter().map(Product::from).collect(),
            total,
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("{PRODUCT_COLUMNS} WHERE p.id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product and returns its id.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<i64> {
        debug!(name = %product.name, "Inserting product");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, price_cents, image_url, stock, category_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.image_url)
        .bind(product.stock)
        .bind(product.category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Changes the catalog price of a product.
    ///
    /// Existing orders keep the price they were created with.
    pub async fn update_price(&self, id: i64, price: Money) -> DbResult<()> {
        debug!(id = id, price = %price, "Updating product price");

        let result = sqlx::query("UPDATE products SET price_cents = ?2 WHERE id = ?1")
            .bind(id)
            .bind(price.cents())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Appends the WHERE clause for `query` to `qb`.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ProductQuery) {
    qb.push(" WHERE 1 = 1");

    if let Some(category_id) = query.category_id {
        qb.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(min) = query.price_min {
        qb.push(" AND p.price_cents >= ").push_bind(min.cents());
    }
    if let Some(max) = query.price_max {
        qb.push(" AND p.price_cents <= ").push_bind(max.cents());
    }
    if let Some(search) = &query.search {
        qb.push(" AND LOWER(p.name) LIKE ")
            .push_bind(like_pattern(search))
            .push(" ESCAPE '\\'");
    }
}

/// `%needle%`, lowercased, with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Unit Tests
// =============================================================================
