use async_trait::async_trait;
use common::{CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, ProductId, UserId};

use crate::{
    CartItemRecord, CartRecord, CategoryRecord, OrderItemRecord, OrderRecord, PaymentRecord,
    ProductRecord, Result, StoreError,
};

/// Core trait for commerce store implementations.
///
/// A commerce store persists the catalog, cart, order, and payment rows and
/// enforces the storage-level consistency rules: tombstone exclusion on
/// every active-row read, at-most-one-active-row uniqueness, and the atomic
/// conditional stock decrement. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// Checks that the backing storage is reachable.
    async fn ping(&self) -> Result<()>;

    /// Inserts a category.
    async fn insert_category(&self, category: CategoryRecord) -> Result<()>;

    /// Retrieves an active category, or None if absent or soft-deleted.
    async fn get_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>>;

    /// Inserts a product.
    async fn insert_product(&self, product: ProductRecord) -> Result<()>;

    /// Retrieves an active product, or None if absent or soft-deleted.
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Atomically decrements a product's stock.
    ///
    /// The availability check and the write are one guarded step scoped to
    /// the product row: the decrement applies only if the product is active
    /// and `quantity` units are available, and two concurrent calls can
    /// never both succeed against the same units. Returns the updated
    /// product, or None when no active row had sufficient stock (the caller
    /// re-reads to tell a missing product from a short one).
    async fn decrement_product_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<ProductRecord>>;

    /// Atomically adds stock back to a product.
    ///
    /// Compensating inverse of [`decrement_product_quantity`]. Returns the
    /// updated product, or None if the product is absent or soft-deleted.
    ///
    /// [`decrement_product_quantity`]: CommerceStore::decrement_product_quantity
    async fn increment_product_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<ProductRecord>>;

    /// Inserts a cart.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the user already has an
    /// active cart.
    async fn insert_cart(&self, cart: CartRecord) -> Result<()>;

    /// Retrieves an active cart, or None if absent or soft-deleted.
    async fn get_cart(&self, id: CartId) -> Result<Option<CartRecord>>;

    /// Retrieves a user's active cart, or None if they have none.
    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<CartRecord>>;

    /// Overwrites the stored total of an active cart.
    ///
    /// Returns the updated cart, or None if the cart is absent or
    /// soft-deleted.
    async fn update_cart_total(&self, id: CartId, total: Money) -> Result<Option<CartRecord>>;

    /// Soft-deletes a cart together with all of its active items.
    ///
    /// The tombstones land atomically; a reader never sees a dead cart with
    /// live items. Returns the tombstoned cart, or None if no active cart
    /// had this id.
    async fn soft_delete_cart_and_items(&self, id: CartId) -> Result<Option<CartRecord>>;

    /// Inserts a cart item.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the cart already holds
    /// an active item for the same product.
    async fn insert_cart_item(&self, item: CartItemRecord) -> Result<()>;

    /// Retrieves an active cart item, or None if absent or soft-deleted.
    async fn get_cart_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>>;

    /// Retrieves the active item a cart holds for a product, if any.
    async fn get_cart_item_by_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>>;

    /// Retrieves all active items of a cart, oldest first.
    ///
    /// The ordering is the listing order checkout commits stock in, so it
    /// must be stable across reads.
    async fn list_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>>;

    /// Overwrites the quantity of an active cart item.
    ///
    /// Returns the updated item, or None if the item is absent or
    /// soft-deleted.
    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: u32,
    ) -> Result<Option<CartItemRecord>>;

    /// Soft-deletes a cart item.
    ///
    /// Returns the tombstoned item, or None if no active item had this id.
    async fn soft_delete_cart_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>>;

    /// Inserts a bare order row without items.
    async fn insert_order(&self, order: OrderRecord) -> Result<()>;

    /// Persists an order together with all of its items.
    ///
    /// The writes are atomic: either the order and every item land, or
    /// nothing does. Lines must pass [`validate_order_lines`] first.
    async fn insert_order_with_items(
        &self,
        order: OrderRecord,
        items: Vec<OrderItemRecord>,
    ) -> Result<()>;

    /// Appends a single item to an existing order.
    async fn insert_order_item(&self, item: OrderItemRecord) -> Result<()>;

    /// Retrieves an order, or None if absent. Orders have no tombstone.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Retrieves all orders of a user, newest first.
    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;

    /// Retrieves all items of an order, oldest first.
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>>;

    /// Retrieves a single order item, or None if absent.
    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItemRecord>>;

    /// Inserts a payment.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the user already has an
    /// active payment.
    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()>;

    /// Retrieves a user's active payment, or None if they have none.
    async fn get_payment_by_user(&self, user_id: UserId) -> Result<Option<PaymentRecord>>;
}

/// Validates order lines before an atomic order-with-items write.
///
/// That write carries an order and its full set of lines in one shot, so a
/// mismatched or empty set is a caller bug surfaced here rather than a
/// half-written order.
pub fn validate_order_lines(order: &OrderRecord, items: &[OrderItemRecord]) -> Result<()> {
    if items.is_empty() {
        return Err(StoreError::InvalidOrderLines(
            "an order must have at least one item".to_string(),
        ));
    }
    for item in items {
        if item.order_id != order.id {
            return Err(StoreError::InvalidOrderLines(format!(
                "item {} references order {}, expected {}",
                item.id, item.order_id, order.id
            )));
        }
    }
    Ok(())
}
