//! Payment eligibility gate.
//!
//! Payment lifecycle is owned by an external collaborator; this core only
//! needs to know whether a user has an active payment record before it
//! lets a checkout proceed.

use commerce_store::{CommerceStore, PaymentRecord, StoreError};
use common::UserId;

use crate::error::CommerceError;

/// Checks and registers per-user payment records.
pub struct PaymentGate<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> PaymentGate<S> {
    /// Creates a new payment gate over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's active payment record, failing `PaymentNotFound`
    /// if there is none.
    #[tracing::instrument(skip(self))]
    pub async fn require_payment(&self, user_id: UserId) -> Result<PaymentRecord, CommerceError> {
        self.store
            .get_payment_by_user(user_id)
            .await?
            .ok_or(CommerceError::PaymentNotFound)
    }

    /// Registers a payment record for the user.
    ///
    /// At most one active payment exists per user; a second registration
    /// fails `PaymentAlreadyExists` whether it loses to an earlier row or
    /// to a concurrent insert.
    #[tracing::instrument(skip(self))]
    pub async fn register(
        &self,
        user_id: UserId,
        provider: String,
        status: bool,
    ) -> Result<PaymentRecord, CommerceError> {
        if provider.is_empty() {
            return Err(CommerceError::validation("provider should not be empty"));
        }

        if self.store.get_payment_by_user(user_id).await?.is_some() {
            return Err(CommerceError::PaymentAlreadyExists);
        }

        let payment = PaymentRecord::new(user_id, provider, status);
        match self.store.insert_payment(payment.clone()).await {
            Ok(()) => Ok(payment),
            Err(StoreError::UniqueViolation { .. }) => Err(CommerceError::PaymentAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }
}
