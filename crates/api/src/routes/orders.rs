//! Order read endpoints.
//!
//! Orders are written only by checkout; over HTTP they are read-only.
//! Every read is scoped to the authenticated user.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use commerce_store::{CommerceStore, OrderItemRecord, OrderRecord};
use common::{OrderId, OrderItemId, PaymentId, ProductId, UserId};
use domain::OrderWithItems;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            payment_id: order.payment_id,
            total_cents: order.total.cents(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderWithItems> for OrderDetailResponse {
    fn from(view: OrderWithItems) -> Self {
        Self {
            id: view.order.id,
            user_id: view.order.user_id,
            payment_id: view.order.payment_id,
            total_cents: view.order.total.cents(),
            created_at: view.order.created_at,
            order_items: view.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// GET /order — the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders(user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /order/{id} — one order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let view = state.orders.list_order_items(user_id, order_id).await?;
    Ok(Json(view.into()))
}

/// GET /order-item/{id} — one order item.
#[tracing::instrument(skip(state))]
pub async fn get_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(order_item_id): Path<OrderItemId>,
) -> Result<Json<OrderItemResponse>, ApiError> {
    let item = state.orders.get_order_item(user_id, order_item_id).await?;
    Ok(Json(item.into()))
}
