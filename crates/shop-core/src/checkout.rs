//! # Checkout Rules
//!
//! Pure checkout logic: everything the order engine decides before and
//! after it talks to the store.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Pipeline                               │
//! │                                                                         │
//! │  CheckoutRequest                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate()            1. identity   → IdentityRequired                 │
//! │       │                2. address    → InvalidAddress                   │
//! │       │                3. lines      → EmptyOrder / InvalidQuantity     │
//! │       ▼                                                                 │
//! │  ValidatedCheckout                                                      │
//! │       │                                                                 │
//! │       ├──► product_ids() ──► InventoryLookup (shop-db)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_inventory()     4. existence  → ProductNotFound                  │
//! │       │                5. stock      → InsufficientStock                │
//! │       ▼                                                                 │
//! │  price()               Σ quantity × unit_price (checked, exact)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricedOrder { lines, total }                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 4 and 5 run twice: once against the lookup as a cheap pre-check,
//! and again inside the store transaction where the conditional stock
//! decrement is authoritative. [`ValidatedCheckout::price`] is fed the
//! snapshots read inside that transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::email::Email;
use crate::error::{OrderError, OrderResult};
use crate::money::Money;
use crate::types::{OrderLine, OrderOwner, ProductSnapshot};
use crate::MIN_SHIPPING_ADDRESS_LEN;

// =============================================================================
// Request Types
// =============================================================================

/// One requested line: a product and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// Everything a client submits to create an order, plus the resolved
/// identity of the requester (if they presented a valid token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub user_id: Option<i64>,
    pub guest_email: Option<String>,
    pub shipping_address: String,
    pub items: Vec<LineRequest>,
}

// =============================================================================
// Validation (steps 1-3)
// =============================================================================

/// A checkout request that passed identity, address and line validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    owner: OrderOwner,
    shipping_address: String,
    lines: Vec<LineRequest>,
}

/// Validates a checkout request without touching the store.
///
/// ## Rules (checked in this order)
/// 1. A user identity, or else a syntactically valid guest email. When both
///    are present the user wins and the email is ignored.
/// 2. Trimmed shipping address of at least [`MIN_SHIPPING_ADDRESS_LEN`]
///    characters.
/// 3. At least one line, every quantity > 0.
///
/// ## Example
/// ```rust
/// use shop_core::checkout::{validate, CheckoutRequest, LineRequest};
/// use shop_core::OrderError;
///
/// let request = CheckoutRequest {
///     user_id: None,
///     guest_email: None,
///     shipping_address: "Jl. Merdeka No. 1".to_string(),
///     items: vec![LineRequest { product_id: 1, quantity: 1 }],
/// };
/// assert_eq!(validate(&request), Err(OrderError::IdentityRequired));
/// ```
pub fn validate(request: &CheckoutRequest) -> OrderResult<ValidatedCheckout> {
    let owner = resolve_owner(request.user_id, request.guest_email.as_deref())?;

    let shipping_address = request.shipping_address.trim();
    if shipping_address.chars().count() < MIN_SHIPPING_ADDRESS_LEN {
        return Err(OrderError::InvalidAddress {
            min: MIN_SHIPPING_ADDRESS_LEN,
        });
    }

    if request.items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    if let Some(bad) = request.items.iter().find(|line| line.quantity <= 0) {
        return Err(OrderError::InvalidQuantity {
            product_id: bad.product_id,
            quantity: bad.quantity,
        });
    }

    Ok(ValidatedCheckout {
        owner,
        shipping_address: shipping_address.to_string(),
        lines: request.items.clone(),
    })
}

fn resolve_owner(user_id: Option<i64>, guest_email: Option<&str>) -> OrderResult<OrderOwner> {
    if let Some(id) = user_id {
        return Ok(OrderOwner::User(id));
    }

    guest_email
        .and_then(|raw| Email::parse(raw).ok())
        .map(OrderOwner::Guest)
        .ok_or(OrderError::IdentityRequired)
}

impl ValidatedCheckout {
    pub fn owner(&self) -> &OrderOwner {
        &self.owner
    }

    /// The trimmed shipping address.
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Lines exactly as requested, repeats included.
    pub fn lines(&self) -> &[LineRequest] {
        &self.lines
    }

    /// Distinct product ids in request order.
    pub fn product_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }

    /// Total requested units per distinct product, in request order.
    ///
    /// A product listed on several lines needs stock for all of them.
    pub fn requested_quantities(&self) -> Vec<(i64, i64)> {
        let mut totals: Vec<(i64, i64)> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty = qty.saturating_add(line.quantity),
                None => totals.push((line.product_id, line.quantity)),
            }
        }
        totals
    }

    // =========================================================================
    // Inventory (steps 4-5)
    // =========================================================================

    /// Checks that every product exists and has enough stock.
    ///
    /// Reports the first missing product in request order, then the first
    /// product whose stock cannot cover the summed requested quantity.
    pub fn check_inventory(&self, snapshots: &HashMap<i64, ProductSnapshot>) -> OrderResult<()> {
        let requested = self.requested_quantities();

        if let Some((missing, _)) = requested.iter().find(|(id, _)| !snapshots.contains_key(id)) {
            return Err(OrderError::ProductNotFound {
                product_id: *missing,
            });
        }

        for (product_id, quantity) in requested {
            let snapshot = &snapshots[&product_id];
            if snapshot.stock < quantity {
                return Err(OrderError::InsufficientStock {
                    product_id,
                    name: snapshot.name.clone(),
                    available: snapshot.stock,
                    requested: quantity,
                });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Prices every line from `snapshots` and sums the total.
    ///
    /// Arithmetic is exact integer cents. An overflowing line total (or an
    /// overflowing running total) is reported as `InvalidQuantity` for that
    /// line.
    pub fn price(&self, snapshots: &HashMap<i64, ProductSnapshot>) -> OrderResult<PricedOrder> {
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut total = Money::zero();

        for request in &self.lines {
            let snapshot = snapshots
                .get(&request.product_id)
                .ok_or(OrderError::ProductNotFound {
                    product_id: request.product_id,
                })?;

            let overflow = || OrderError::InvalidQuantity {
                product_id: request.product_id,
                quantity: request.quantity,
            };

            let line_total = snapshot
                .price
                .checked_multiply_quantity(request.quantity)
                .ok_or_else(overflow)?;
            total = total.checked_add(line_total).ok_or_else(overflow)?;

            lines.push(OrderLine {
                product_id: request.product_id,
                name: snapshot.name.clone(),
                quantity: request.quantity,
                unit_price: snapshot.price,
            });
        }

        Ok(PricedOrder { lines, total })
    }
}

// =============================================================================
// Priced Order
// =============================================================================

/// Lines with their snapshot prices plus the order total, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<OrderLine>,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(items: Vec<LineRequest>) -> CheckoutRequest {
        CheckoutRequest {
            user_id: None,
            guest_email: Some("guest@example.com".to_string()),
            shipping_address: "Jl. Merdeka No. 1, Jakarta".to_string(),
            items,
        }
    }

    fn line(product_id: i64, quantity: i64) -> LineRequest {
        LineRequest {
            product_id,
            quantity,
        }
    }

    fn snapshot(id: i64, name: &str, price_cents: i64, stock: i64) -> (i64, ProductSnapshot) {
        (
            id,
            ProductSnapshot {
                id,
                name: name.to_string(),
                price: Money::from_cents(price_cents),
                stock,
            },
        )
    }

    fn catalog() -> HashMap<i64, ProductSnapshot> {
        HashMap::from([
            snapshot(1, "Headphone Bluetooth", 29_900_000, 50),
            snapshot(2, "Smartwatch Basic", 49_900_000, 35),
            snapshot(3, "Set Pisau Dapur", 12_900_000, 1),
        ])
    }

    // -------------------------------------------------------------------------
    // validate
    // -------------------------------------------------------------------------

    #[test]
    fn test_guest_checkout_is_valid() {
        let checkout = validate(&request(vec![line(1, 2)])).unwrap();
        assert_eq!(
            checkout.owner().guest_email().map(Email::as_str),
            Some("guest@example.com")
        );
        assert_eq!(checkout.shipping_address(), "Jl. Merdeka No. 1, Jakarta");
    }

    #[test]
    fn test_user_identity_wins_over_guest_email() {
        let mut req = request(vec![line(1, 1)]);
        req.user_id = Some(42);
        let checkout = validate(&req).unwrap();
        assert_eq!(checkout.owner(), &OrderOwner::User(42));
    }

    #[test]
    fn test_identity_required() {
        let mut req = request(vec![line(1, 1)]);
        req.guest_email = None;
        assert_eq!(validate(&req), Err(OrderError::IdentityRequired));

        req.guest_email = Some("   ".to_string());
        assert_eq!(validate(&req), Err(OrderError::IdentityRequired));

        req.guest_email = Some("not-an-email".to_string());
        assert_eq!(validate(&req), Err(OrderError::IdentityRequired));
    }

    #[test]
    fn test_identity_is_checked_before_address() {
        let req = CheckoutRequest {
            user_id: None,
            guest_email: None,
            shipping_address: String::new(),
            items: vec![],
        };
        assert_eq!(validate(&req), Err(OrderError::IdentityRequired));
    }

    #[test]
    fn test_address_is_trimmed_and_measured() {
        let mut req = request(vec![line(1, 1)]);
        req.shipping_address = "  abcd   ".to_string();
        assert_eq!(validate(&req), Err(OrderError::InvalidAddress { min: 5 }));

        req.shipping_address = "  abcde ".to_string();
        assert_eq!(validate(&req).unwrap().shipping_address(), "abcde");
    }

    #[test]
    fn test_empty_order() {
        assert_eq!(validate(&request(vec![])), Err(OrderError::EmptyOrder));
    }

    #[test]
    fn test_non_positive_quantity_names_product() {
        assert_eq!(
            validate(&request(vec![line(1, 1), line(7, 0)])),
            Err(OrderError::InvalidQuantity {
                product_id: 7,
                quantity: 0
            })
        );
        assert_eq!(
            validate(&request(vec![line(3, -2)])),
            Err(OrderError::InvalidQuantity {
                product_id: 3,
                quantity: -2
            })
        );
    }

    #[test]
    fn test_product_ids_are_distinct_in_request_order() {
        let checkout = validate(&request(vec![line(3, 1), line(1, 1), line(3, 2)])).unwrap();
        assert_eq!(checkout.product_ids(), vec![3, 1]);
        assert_eq!(checkout.requested_quantities(), vec![(3, 3), (1, 1)]);
        assert_eq!(checkout.lines().len(), 3);
    }

    // -------------------------------------------------------------------------
    // check_inventory
    // -------------------------------------------------------------------------

    #[test]
    fn test_inventory_ok() {
        let checkout = validate(&request(vec![line(1, 2), line(2, 35)])).unwrap();
        assert!(checkout.check_inventory(&catalog()).is_ok());
    }

    #[test]
    fn test_first_missing_product_is_reported() {
        let checkout = validate(&request(vec![line(1, 1), line(998, 1), line(999, 1)])).unwrap();
        assert_eq!(
            checkout.check_inventory(&catalog()),
            Err(OrderError::ProductNotFound { product_id: 998 })
        );
    }

    #[test]
    fn test_insufficient_stock() {
        let checkout = validate(&request(vec![line(1, 100)])).unwrap();
        assert_eq!(
            checkout.check_inventory(&catalog()),
            Err(OrderError::InsufficientStock {
                product_id: 1,
                name: "Headphone Bluetooth".to_string(),
                available: 50,
                requested: 100,
            })
        );
    }

    #[test]
    fn test_repeated_lines_are_summed_for_stock() {
        let checkout = validate(&request(vec![line(3, 1), line(3, 1)])).unwrap();
        assert!(matches!(
            checkout.check_inventory(&catalog()),
            Err(OrderError::InsufficientStock {
                product_id: 3,
                available: 1,
                requested: 2,
                ..
            })
        ));
    }

    // -------------------------------------------------------------------------
    // price
    // -------------------------------------------------------------------------

    #[test]
    fn test_price_two_headphones() {
        let checkout = validate(&request(vec![line(1, 2)])).unwrap();
        let priced = checkout.price(&catalog()).unwrap();

        assert_eq!(priced.total.to_string(), "598000.00");
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].name, "Headphone Bluetooth");
        assert_eq!(priced.lines[0].unit_price, Money::from_cents(29_900_000));
    }

    #[test]
    fn test_price_keeps_line_order_and_repeats() {
        let checkout = validate(&request(vec![line(2, 1), line(1, 1), line(2, 2)])).unwrap();
        let priced = checkout.price(&catalog()).unwrap();

        let ids: Vec<i64> = priced.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![2, 1, 2]);
        assert_eq!(priced.total.cents(), 3 * 49_900_000 + 29_900_000);
    }

    #[test]
    fn test_price_overflow_is_invalid_quantity() {
        let checkout = validate(&request(vec![line(1, i64::MAX)])).unwrap();
        assert_eq!(
            checkout.price(&catalog()),
            Err(OrderError::InvalidQuantity {
                product_id: 1,
                quantity: i64::MAX
            })
        );
    }

    proptest! {
        #[test]
        fn prop_total_is_exact_sum_of_lines(
            lines in prop::collection::vec((1i64..=1_000_000_000, 1i64..=1_000), 1..20)
        ) {
            let snapshots: HashMap<i64, ProductSnapshot> = lines
                .iter()
                .enumerate()
                .map(|(i, (price, _))| snapshot(i as i64 + 1, "item", *price, 1_000))
                .collect();
            let items: Vec<LineRequest> = lines
                .iter()
                .enumerate()
                .map(|(i, (_, qty))| line(i as i64 + 1, *qty))
                .collect();

            let checkout = validate(&request(items)).unwrap();
            let priced = checkout.price(&snapshots).unwrap();

            let expected: i128 = lines.iter().map(|(p, q)| *p as i128 * *q as i128).sum();
            prop_assert_eq!(priced.total.cents() as i128, expected);

            let from_lines: Money = priced.lines.iter().filter_map(OrderLine::line_total).sum();
            prop_assert_eq!(from_lines, priced.total);
        }
    }
}
