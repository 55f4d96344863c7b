//! Domain services for the storefront core.
//!
//! This crate provides the commerce services on top of the storage layer:
//! - Catalog registration and product lookup
//! - StockLedger, the single authority for stock decrements
//! - CartAggregator, the per-user cart and its derived total
//! - PaymentGate, the checkout eligibility guard
//! - OrderAssembler, immutable order creation and reads
//!
//! All services are generic over [`commerce_store::CommerceStore`] and run
//! unchanged against the in-memory and Postgres backends.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;
pub mod payment;
pub mod stock;

pub use cart::{CartAggregator, CartWithItems};
pub use catalog::Catalog;
pub use error::CommerceError;
pub use order::{OrderAssembler, OrderLine, OrderWithItems};
pub use payment::PaymentGate;
pub use stock::StockLedger;
