//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use commerce_store::CommerceStore;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — healthy only when the backing store answers.
pub async fn check<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<HealthResponse>, ApiError> {
    state.store.ping().await?;
    Ok(Json(HealthResponse { status: "healthy" }))
}
