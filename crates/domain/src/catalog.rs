//! Catalog registration and lookup.
//!
//! Thin collaborator next to the checkout core: enough surface to seed
//! categories and products and to price checkout lines.

use commerce_store::{CategoryRecord, CommerceStore, ProductRecord};
use common::{CategoryId, Money, ProductId};

use crate::error::CommerceError;

/// Registers categories and products and serves product lookups.
pub struct Catalog<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> Catalog<S> {
    /// Creates a new catalog over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a category.
    #[tracing::instrument(skip(self))]
    pub async fn add_category(&self, name: String) -> Result<CategoryRecord, CommerceError> {
        if name.is_empty() {
            return Err(CommerceError::validation("name should not be empty"));
        }

        let category = CategoryRecord::new(name);
        self.store.insert_category(category.clone()).await?;
        Ok(category)
    }

    /// Registers a product under an existing, active category.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        category_id: CategoryId,
        name: String,
        price: Money,
        quantity: u32,
    ) -> Result<ProductRecord, CommerceError> {
        let mut messages = Vec::new();
        if name.is_empty() {
            messages.push("name should not be empty".to_string());
        }
        if price.cents() < 0 {
            messages.push("price must not be less than 0".to_string());
        }
        if !messages.is_empty() {
            return Err(CommerceError::Validation { messages });
        }

        if self.store.get_category(category_id).await?.is_none() {
            return Err(CommerceError::CategoryNotFound);
        }

        let product = ProductRecord::new(category_id, name, price, quantity);
        self.store.insert_product(product.clone()).await?;
        Ok(product)
    }

    /// Looks up an active product.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductRecord, CommerceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(CommerceError::ProductNotFound)
    }
}
