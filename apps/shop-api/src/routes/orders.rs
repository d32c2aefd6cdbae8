//! Order endpoints.
//!
//! - `POST /api/orders` - checkout as the logged-in user or as a guest
//! - `GET  /api/orders?email=` - order history

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_core::checkout::{CheckoutRequest, LineRequest};
use shop_core::{Money, Order, OrderLine};
use ts_rs::TS;

use crate::auth::MaybeUser;
use crate::error::ApiResult;
use crate::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// Checkout request body.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    /// Required when not logged in; ignored otherwise
    #[serde(default)]
    pub guest_email: Option<String>,
    pub shipping_address: String,
    pub items: Vec<OrderItemRequest>,
}

/// One requested line.
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// An order as returned to clients.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub guest_email: Option<String>,
    pub shipping_address: String,
    #[ts(as = "String")]
    pub total_amount: Money,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

/// A line of an order. `price` is the unit price paid.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub price: Money,
}

impl From<OrderLine> for OrderItemResponse {
    fn from(line: OrderLine) -> Self {
        OrderItemResponse {
            product_id: line.product_id,
            name: line.name,
            quantity: line.quantity,
            price: line.unit_price,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id,
            user_id: order.owner.user_id(),
            guest_email: order.owner.guest_email().map(|e| e.to_string()),
            shipping_address: order.shipping_address,
            total_amount: order.total_amount,
            created_at: order.created_at,
            items: order.lines.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// Query of `GET /api/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub email: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<AppState>,
    user: MaybeUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let Json(body) = payload?;

    let request = CheckoutRequest {
        user_id: user.user_id(),
        guest_email: body.guest_email,
        shipping_address: body.shipping_address,
        items: body
            .items
            .into_iter()
            .map(|item| LineRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    };

    let order = state.orders.create_order(&request).await?;
    Ok(Json(order.into()))
}

/// `GET /api/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    user: MaybeUser,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let Query(params) = params?;

    let orders = state
        .orders
        .list_orders(user.user_id(), params.email.as_deref())
        .await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
