//! # Domain Types
//!
//! Core domain types used throughout Mini Shop.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  product_id     │       │
//! │  │  name           │   │  owner          │   │  name           │       │
//! │  │  price (Money)  │   │  total_amount   │   │  quantity       │       │
//! │  │  stock          │   │  lines          │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │   OrderOwner    │   │ ProductSnapshot │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name       │   │  User(id)       │   │  name, price,   │       │
//! │  │                 │   │  Guest(Email)   │   │  stock          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! An [`OrderLine`] freezes the unit price at the instant the order is
//! created. Later catalog price changes never reach existing orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::email::Email;
use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown in the catalog and on orders.
    pub name: String,

    pub description: Option<String>,

    /// Current unit price. Serialized as a decimal string.
    #[ts(as = "String")]
    pub price: Money,

    pub image_url: Option<String>,

    /// Sellable units. Never negative.
    pub stock: i64,

    pub category: Option<Category>,
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductSort {
    /// Newest first (id descending).
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Wire names accepted in the `sort` query parameter.
    pub const ALLOWED: [&'static str; 2] = ["price_asc", "price_desc"];
}

/// Authoritative name, price and stock of a product at lookup time.
///
/// This is what the inventory lookup hands to checkout; it carries nothing
/// the checkout rules don't need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

// =============================================================================
// Order Owner
// =============================================================================

/// Who an order belongs to: a registered user or a guest email.
///
/// Exactly one of the two, never both and never neither. The database
/// mirrors this with a CHECK constraint on `orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderOwner {
    User(i64),
    Guest(Email),
}

impl OrderOwner {
    /// The owning user id, for user orders.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            OrderOwner::User(id) => Some(*id),
            OrderOwner::Guest(_) => None,
        }
    }

    /// The guest email, for guest orders.
    pub fn guest_email(&self) -> Option<&Email> {
        match self {
            OrderOwner::User(_) => None,
            OrderOwner::Guest(email) => Some(email),
        }
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item of an order.
/// Uses snapshot pattern to freeze the unit price at time of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: i64,
    /// Product name for display.
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of order (frozen).
    #[ts(as = "String")]
    pub unit_price: Money,
}

impl OrderLine {
    /// `unit_price × quantity`, or `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A persisted order with its lines in insertion order.
///
/// Orders are immutable after creation: no edit, no cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub owner: OrderOwner,
    pub shipping_address: String,
    /// Σ unit_price × quantity, fixed at creation.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================
