//! Shared types for the storefront core.
//!
//! Every entity identifier is a UUID newtype so that a cart id can never be
//! passed where an order id is expected. Monetary amounts are integer cents.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{
    CartId, CartItemId, CategoryId, OrderId, OrderItemId, PaymentId, ProductId, UserId,
};
