//! Checkout endpoints.
//!
//! Both flows hand off to [`checkout::CheckoutOrchestrator`] and answer
//! with the assembled order. Partial failures are already unwound by the
//! time an error reaches these handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use commerce_store::CommerceStore;
use common::ProductId;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::orders::OrderDetailResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BuyProductRequest {
    pub quantity: u32,
}

/// POST /cart/checkout — purchases every active item in the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn purchase_cart<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
) -> Result<(StatusCode, Json<OrderDetailResponse>), ApiError> {
    let assembled = state.checkout.purchase_cart(user_id).await?;
    Ok((StatusCode::CREATED, Json(assembled.into())))
}

/// POST /products/{id}/checkout — purchases one product directly.
#[tracing::instrument(skip(state, req))]
pub async fn purchase_product<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(product_id): Path<ProductId>,
    Json(req): Json<BuyProductRequest>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), ApiError> {
    let assembled = state
        .checkout
        .purchase_one(user_id, product_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(assembled.into())))
}
