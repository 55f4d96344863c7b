//! Payment registration endpoint.
//!
//! Payment processing itself lives with an external provider; this service
//! only records which provider a user checked out with and whether that
//! provider confirmed.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use commerce_store::{CommerceStore, PaymentRecord};
use common::{PaymentId, UserId};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub provider: String,
    pub status: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub user_id: UserId,
    pub provider: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(payment: PaymentRecord) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            provider: payment.provider,
            status: payment.status,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
            deleted_at: payment.deleted_at,
        }
    }
}

/// POST /payment — records the caller's payment provider.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let payment = state
        .payments
        .register(user_id, req.provider, req.status)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}
