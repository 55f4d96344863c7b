//! Cart aggregation: per-user active cart, its items, and the derived total.

use commerce_store::{CartItemRecord, CartRecord, CommerceStore, ProductRecord, StoreError};
use common::{CartId, CartItemId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::CommerceError;

/// A cart together with its active items, as returned by reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartWithItems {
    pub cart: CartRecord,
    pub items: Vec<CartItemRecord>,
}

/// Owns the user's active cart and keeps `cart.total` consistent with the
/// active items.
///
/// The stored total is derived state: it is recomputed from current item
/// quantities and current product prices after every mutation and on every
/// read, so a price change after add-to-cart shows up in the next read.
/// Adding an item never touches stock; sufficiency is only checked
/// read-only here, and the actual decrement happens at checkout.
pub struct CartAggregator<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> CartAggregator<S> {
    /// Creates a new cart aggregator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's active cart, creating an empty one if absent.
    #[tracing::instrument(skip(self))]
    pub async fn find_or_create_cart(&self, user_id: UserId) -> Result<CartRecord, CommerceError> {
        if let Some(cart) = self.store.get_cart_by_user(user_id).await? {
            return Ok(cart);
        }

        let cart = CartRecord::new(user_id);
        match self.store.insert_cart(cart.clone()).await {
            Ok(()) => Ok(cart),
            // Lost a creation race; the winner's cart is the user's cart.
            Err(StoreError::UniqueViolation { .. }) => self
                .store
                .get_cart_by_user(user_id)
                .await?
                .ok_or(CommerceError::CartNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Adds a product to the user's cart and returns the created item.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItemRecord, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::validation(
                "quantity must be a positive number",
            ));
        }

        let cart = self.find_or_create_cart(user_id).await?;

        if self
            .store
            .get_cart_item_by_product(cart.id, product_id)
            .await?
            .is_some()
        {
            return Err(CommerceError::ProductAlreadyExistsInCart);
        }

        self.check_product_quantity(product_id, quantity).await?;

        let item = CartItemRecord::new(cart.id, product_id, quantity);
        match self.store.insert_cart_item(item.clone()).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation { .. }) => {
                return Err(CommerceError::ProductAlreadyExistsInCart);
            }
            Err(e) => return Err(e.into()),
        }

        self.calculate_total_price(cart.id).await?;
        Ok(item)
    }

    /// Overwrites an item's quantity and returns the updated item.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        cart_item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItemRecord, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::validation(
                "quantity must be a positive number",
            ));
        }

        let item = self
            .store
            .get_cart_item(cart_item_id)
            .await?
            .ok_or(CommerceError::CartItemNotFound)?;
        let cart = self
            .store
            .get_cart(item.cart_id)
            .await?
            .ok_or(CommerceError::CartNotFound)?;
        if cart.user_id != user_id {
            return Err(CommerceError::Unauthorized);
        }

        self.check_product_quantity(item.product_id, quantity).await?;

        let updated = self
            .store
            .update_cart_item_quantity(cart_item_id, quantity)
            .await?
            .ok_or(CommerceError::CartItemNotFound)?;

        self.calculate_total_price(cart.id).await?;
        Ok(updated)
    }

    /// Soft-deletes an item and returns it.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        cart_item_id: CartItemId,
    ) -> Result<CartItemRecord, CommerceError> {
        let item = self
            .store
            .get_cart_item(cart_item_id)
            .await?
            .ok_or(CommerceError::CartItemNotFound)?;
        let cart = self
            .store
            .get_cart(item.cart_id)
            .await?
            .ok_or(CommerceError::CartNotFound)?;
        if cart.user_id != user_id {
            return Err(CommerceError::Unauthorized);
        }

        let removed = self
            .store
            .soft_delete_cart_item(cart_item_id)
            .await?
            .ok_or(CommerceError::CartItemNotFound)?;

        self.calculate_total_price(cart.id).await?;
        Ok(removed)
    }

    /// Refresh-then-read: recomputes the cart total, then returns the cart
    /// with its active items.
    ///
    /// Checkout trusts the total returned here without recomputing it.
    #[tracing::instrument(skip(self))]
    pub async fn list_items(&self, user_id: UserId) -> Result<CartWithItems, CommerceError> {
        let cart = self.find_or_create_cart(user_id).await?;
        let cart = self.calculate_total_price(cart.id).await?;
        let items = self.store.list_cart_items(cart.id).await?;
        Ok(CartWithItems { cart, items })
    }

    /// Recomputes the cart total from active items at current product
    /// prices, persists it, and returns the updated cart.
    ///
    /// Items whose product has been soft-deleted contribute nothing.
    #[tracing::instrument(skip(self))]
    pub async fn calculate_total_price(&self, cart_id: CartId) -> Result<CartRecord, CommerceError> {
        let items = self.store.list_cart_items(cart_id).await?;

        let mut total = Money::zero();
        for item in &items {
            if let Some(product) = self.store.get_product(item.product_id).await? {
                total += product.price.multiply(item.quantity);
            }
        }

        self.store
            .update_cart_total(cart_id, total)
            .await?
            .ok_or(CommerceError::CartNotFound)
    }

    /// Soft-deletes the cart and all of its active items.
    ///
    /// A fresh empty cart is lazily created on the user's next access.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, cart_id: CartId) -> Result<CartRecord, CommerceError> {
        self.store
            .soft_delete_cart_and_items(cart_id)
            .await?
            .ok_or(CommerceError::CartNotFound)
    }

    /// Read-only stock sufficiency check.
    async fn check_product_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductRecord, CommerceError> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound)?;

        if product.quantity < quantity {
            return Err(CommerceError::ProductQuantityLack {
                product_id,
                available: product.quantity,
                requested: quantity,
            });
        }

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_store::InMemoryCommerceStore;
    use common::CategoryId;

    async fn seed_product(
        store: &InMemoryCommerceStore,
        price_cents: i64,
        quantity: u32,
    ) -> ProductRecord {
        let product = ProductRecord::new(
            CategoryId::new(),
            "Widget",
            Money::from_cents(price_cents),
            quantity,
        );
        store.insert_product(product.clone()).await.unwrap();
        product
    }

    #[tokio::test]
    async fn test_find_or_create_cart_reuses_active_cart() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store);
        let user_id = UserId::new();

        let first = carts.find_or_create_cart(user_id).await.unwrap();
        let second = carts.find_or_create_cart(user_id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.total, Money::zero());
    }

    #[tokio::test]
    async fn test_add_item_persists_and_refreshes_total() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        let item = carts.add_item(user_id, product.id, 2).await.unwrap();

        assert_eq!(item.quantity, 2);
        let cart = store.get_cart(item.cart_id).await.unwrap().unwrap();
        assert_eq!(cart.total, Money::from_cents(600));
    }

    #[tokio::test]
    async fn test_add_item_requires_positive_quantity() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let product = seed_product(&store, 300, 10).await;

        let result = carts.add_item(UserId::new(), product.id, 0).await;

        assert!(matches!(result, Err(CommerceError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_add_item_rejects_duplicate_product() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        carts.add_item(user_id, product.id, 2).await.unwrap();
        let result = carts.add_item(user_id, product.id, 3).await;

        assert!(matches!(
            result,
            Err(CommerceError::ProductAlreadyExistsInCart)
        ));
    }

    #[tokio::test]
    async fn test_add_item_rejects_insufficient_stock() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let product = seed_product(&store, 300, 5).await;

        let result = carts.add_item(UserId::new(), product.id, 6).await;

        assert!(matches!(
            result,
            Err(CommerceError::ProductQuantityLack {
                available: 5,
                requested: 6,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_add_item_unknown_product() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store);

        let result = carts.add_item(UserId::new(), ProductId::new(), 1).await;

        assert!(matches!(result, Err(CommerceError::ProductNotFound)));
    }

    #[tokio::test]
    async fn test_update_item_recomputes_total() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        let item = carts.add_item(user_id, product.id, 2).await.unwrap();
        let updated = carts.update_item(user_id, item.id, 5).await.unwrap();

        assert_eq!(updated.quantity, 5);
        let cart = store.get_cart(item.cart_id).await.unwrap().unwrap();
        assert_eq!(cart.total, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn test_update_item_not_found() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store);

        let result = carts.update_item(UserId::new(), CartItemId::new(), 1).await;

        assert!(matches!(result, Err(CommerceError::CartItemNotFound)));
    }

    #[tokio::test]
    async fn test_update_item_cross_user_is_unauthorized() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let owner = UserId::new();
        let intruder = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        let item = carts.add_item(owner, product.id, 2).await.unwrap();
        let result = carts.update_item(intruder, item.id, 9).await;

        assert!(matches!(result, Err(CommerceError::Unauthorized)));
        // No mutation happened.
        let unchanged = store.get_cart_item(item.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, 2);
    }

    #[tokio::test]
    async fn test_remove_item_recomputes_total() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product_a = seed_product(&store, 300, 10).await;
        let product_b = seed_product(&store, 700, 10).await;

        let item_a = carts.add_item(user_id, product_a.id, 2).await.unwrap();
        carts.add_item(user_id, product_b.id, 1).await.unwrap();

        let removed = carts.remove_item(user_id, item_a.id).await.unwrap();

        assert!(removed.deleted_at.is_some());
        let cart = store.get_cart(item_a.cart_id).await.unwrap().unwrap();
        assert_eq!(cart.total, Money::from_cents(700));
    }

    #[tokio::test]
    async fn test_remove_item_cross_user_is_unauthorized() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let owner = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        let item = carts.add_item(owner, product.id, 2).await.unwrap();
        let result = carts.remove_item(UserId::new(), item.id).await;

        assert!(matches!(result, Err(CommerceError::Unauthorized)));
        assert!(store.get_cart_item(item.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_items_returns_refreshed_total() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 500, 10).await;

        carts.add_item(user_id, product.id, 2).await.unwrap();

        // Reprice the product after it went into the cart.
        let repriced = ProductRecord {
            price: Money::from_cents(400),
            ..product.clone()
        };
        store.insert_product(repriced).await.unwrap();

        let view = carts.list_items(user_id).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.cart.total, Money::from_cents(800));
    }

    #[tokio::test]
    async fn test_list_items_creates_empty_cart_for_new_user() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store);

        let view = carts.list_items(UserId::new()).await.unwrap();

        assert!(view.items.is_empty());
        assert_eq!(view.cart.total, Money::zero());
    }

    #[tokio::test]
    async fn test_tombstoned_product_contributes_nothing_to_total() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product_a = seed_product(&store, 300, 10).await;
        let product_b = seed_product(&store, 700, 10).await;

        carts.add_item(user_id, product_a.id, 1).await.unwrap();
        carts.add_item(user_id, product_b.id, 1).await.unwrap();

        // Tombstone product B; its line stays but stops counting.
        let gone = ProductRecord {
            deleted_at: Some(chrono::Utc::now()),
            ..product_b.clone()
        };
        store.insert_product(gone).await.unwrap();

        let view = carts.list_items(user_id).await.unwrap();
        assert_eq!(view.cart.total, Money::from_cents(300));
    }

    #[tokio::test]
    async fn test_clear_tombstones_cart_and_items() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        let item = carts.add_item(user_id, product.id, 2).await.unwrap();
        let cleared = carts.clear(item.cart_id).await.unwrap();

        assert!(cleared.deleted_at.is_some());
        assert!(store.get_cart_item(item.id).await.unwrap().is_none());

        // Next access starts a fresh empty cart.
        let fresh = carts.list_items(user_id).await.unwrap();
        assert_ne!(fresh.cart.id, item.cart_id);
        assert!(fresh.items.is_empty());
    }

    #[tokio::test]
    async fn test_clear_unknown_cart() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store);

        let result = carts.clear(CartId::new()).await;

        assert!(matches!(result, Err(CommerceError::CartNotFound)));
    }
}
