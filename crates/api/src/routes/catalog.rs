//! Catalog endpoints: categories and products.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use commerce_store::{CategoryRecord, CommerceStore, ProductRecord};
use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<CategoryRecord> for CategoryResponse {
    fn from(category: CategoryRecord) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
            updated_at: category.updated_at,
            deleted_at: category.deleted_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub category_id: CategoryId,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            price_cents: product.price.cents(),
            quantity: product.quantity,
            created_at: product.created_at,
            updated_at: product.updated_at,
            deleted_at: product.deleted_at,
        }
    }
}

/// POST /category — registers a new category.
#[tracing::instrument(skip(state, req))]
pub async fn create_category<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state.catalog.add_category(req.name).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// POST /products — registers a new product under a category.
#[tracing::instrument(skip(state, req))]
pub async fn create_product<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state
        .catalog
        .add_product(
            req.category_id,
            req.name,
            Money::from_cents(req.price_cents),
            req.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products/{id} — looks up an active product.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(product_id).await?;
    Ok(Json(product.into()))
}
