use thiserror::Error;

/// Errors that can occur when interacting with the commerce store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert collided with a uniqueness rule on active rows, such as
    /// the one-active-cart-per-user index. Carries the constraint name so
    /// callers can translate it into a domain error.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// An order was submitted with no lines or with lines referencing a
    /// different order.
    #[error("Invalid order lines: {0}")]
    InvalidOrderLines(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Index names enforcing at-most-one-active-row rules.
///
/// The Postgres backend reads these back from constraint violations; the
/// in-memory backend raises them from its own pre-insert checks so both
/// backends surface identical [`StoreError::UniqueViolation`] values.
pub mod constraints {
    pub const ACTIVE_CART_PER_USER: &str = "uniq_active_cart_per_user";
    pub const ACTIVE_CART_ITEM_PER_PRODUCT: &str = "uniq_active_cart_item_per_product";
    pub const ACTIVE_PAYMENT_PER_USER: &str = "uniq_active_payment_per_user";
}
