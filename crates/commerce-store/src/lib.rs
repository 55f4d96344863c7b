//! Persistence layer for the storefront core.
//!
//! Defines the record types, the [`CommerceStore`] trait, and two
//! implementations: [`InMemoryCommerceStore`] for tests and local runs, and
//! [`PostgresCommerceStore`] for production. Both enforce the same
//! storage-level contract, most importantly the atomic conditional stock
//! decrement that keeps concurrent checkouts from overselling.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryCommerceStore;
pub use postgres::PostgresCommerceStore;
pub use records::{
    CartItemRecord, CartRecord, CategoryRecord, OrderItemRecord, OrderRecord, PaymentRecord,
    ProductRecord,
};
pub use store::{CommerceStore, validate_order_lines};
