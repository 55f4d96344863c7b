//! Domain error taxonomy.
//!
//! Every message here is part of the external contract: clients match on
//! these exact strings, so they must not drift.

use commerce_store::StoreError;
use common::ProductId;
use thiserror::Error;

/// Errors surfaced by the commerce domain services.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The product is absent or soft-deleted.
    #[error("product not found")]
    ProductNotFound,

    /// The category is absent or soft-deleted.
    #[error("category not found")]
    CategoryNotFound,

    /// The cart is absent or soft-deleted.
    #[error("cart not found")]
    CartNotFound,

    /// The cart item is absent or soft-deleted.
    #[error("cart item not found")]
    CartItemNotFound,

    /// The cart already holds an active item for this product.
    #[error("product already exists in cart")]
    ProductAlreadyExistsInCart,

    /// Available stock does not cover the requested quantity.
    #[error("ProductId {product_id} has {available} items. claimed {requested} items")]
    ProductQuantityLack {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// Checkout was attempted against a cart with no active items.
    #[error("cart empty")]
    CartEmpty,

    /// The user has no active payment record.
    #[error("payment not found")]
    PaymentNotFound,

    /// The user already has an active payment record.
    #[error("payment already exists")]
    PaymentAlreadyExists,

    /// The order is absent.
    #[error("order not found")]
    OrderNotFound,

    /// The order item is absent.
    #[error("order item not found")]
    OrderItemNotFound,

    /// The target resource belongs to another user.
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed input; one message per rejected field.
    #[error("{}", .messages.join(", "))]
    Validation { messages: Vec<String> },

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CommerceError {
    /// Builds a single-message validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CommerceError::Validation {
            messages: vec![message.into()],
        }
    }
}
