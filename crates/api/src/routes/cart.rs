//! Cart endpoints: add, read, update, and remove items.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use commerce_store::{CartItemRecord, CommerceStore};
use common::{CartId, CartItemId, ProductId, UserId};
use domain::CartWithItems;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<CartItemRecord> for CartItemResponse {
    fn from(item: CartItemRecord) -> Self {
        Self {
            id: item.id,
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
            created_at: item.created_at,
            updated_at: item.updated_at,
            deleted_at: item.deleted_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: CartId,
    pub user_id: UserId,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cart_items: Vec<CartItemResponse>,
}

impl From<CartWithItems> for CartResponse {
    fn from(view: CartWithItems) -> Self {
        Self {
            id: view.cart.id,
            user_id: view.cart.user_id,
            total_cents: view.cart.total.cents(),
            created_at: view.cart.created_at,
            updated_at: view.cart.updated_at,
            cart_items: view.items.into_iter().map(CartItemResponse::from).collect(),
        }
    }
}

/// POST /cart — adds a product to the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartItemResponse>), ApiError> {
    let item = state
        .carts
        .add_item(user_id, req.product_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /cart — the caller's cart with its active items and current total.
#[tracing::instrument(skip(state))]
pub async fn get_cart<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.carts.list_items(user_id).await?;
    Ok(Json(view.into()))
}

/// PATCH /cart/{id} — replaces a cart item's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(cart_item_id): Path<CartItemId>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<CartItemResponse>, ApiError> {
    let item = state
        .carts
        .update_item(user_id, cart_item_id, req.quantity)
        .await?;
    Ok(Json(item.into()))
}

/// DELETE /cart/{id} — soft-deletes a cart item and returns it.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(cart_item_id): Path<CartItemId>,
) -> Result<Json<CartItemResponse>, ApiError> {
    let item = state.carts.remove_item(user_id, cart_item_id).await?;
    Ok(Json(item.into()))
}
