//! Stock ledger: the single authority for moving product stock.

use commerce_store::{CommerceStore, ProductRecord};
use common::ProductId;

use crate::error::CommerceError;

/// Decrements and restores product stock.
///
/// `sold` is the only path that reduces stock, and it delegates the
/// check-and-decrement to the store's conditional update so that two
/// concurrent buyers can never jointly oversell a product. A rejected
/// decrement is re-read once to tell a missing product apart from an
/// insufficient one.
pub struct StockLedger<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> StockLedger<S> {
    /// Creates a new stock ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Commits a sale of `quantity` units, returning the updated product.
    ///
    /// Fails `ProductQuantityLack` without changing anything when available
    /// stock is short. Callers must treat that as terminal for the current
    /// attempt; nothing here retries.
    #[tracing::instrument(skip(self))]
    pub async fn sold(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductRecord, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::validation(
                "quantity must be a positive number",
            ));
        }

        if let Some(updated) = self
            .store
            .decrement_product_quantity(product_id, quantity)
            .await?
        {
            return Ok(updated);
        }

        // The conditional update matched no row: either the product is gone
        // or the stock is short. One re-read decides which.
        match self.store.get_product(product_id).await? {
            None => Err(CommerceError::ProductNotFound),
            Some(product) => Err(CommerceError::ProductQuantityLack {
                product_id,
                available: product.quantity,
                requested: quantity,
            }),
        }
    }

    /// Adds `quantity` units back, returning the updated product.
    ///
    /// The compensating inverse of [`sold`](Self::sold); used when a later
    /// checkout step fails after this line's stock was already committed.
    #[tracing::instrument(skip(self))]
    pub async fn restock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductRecord, CommerceError> {
        self.store
            .increment_product_quantity(product_id, quantity)
            .await?
            .ok_or(CommerceError::ProductNotFound)
    }
}
