//! HTTP route handlers, one module per resource.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payment;
