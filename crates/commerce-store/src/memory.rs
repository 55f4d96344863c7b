use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, PaymentId, ProductId, UserId,
};
use tokio::sync::RwLock;

use crate::{
    CartItemRecord, CartRecord, CategoryRecord, OrderItemRecord, OrderRecord, PaymentRecord,
    ProductRecord, Result, StoreError,
    error::constraints,
    store::{CommerceStore, validate_order_lines},
};

/// In-memory commerce store implementation.
///
/// Backs tests and local runs without a database while honoring the same
/// contract as the PostgreSQL implementation: tombstone exclusion, the
/// active-row uniqueness rules, and the guarded stock decrement. The
/// decrement holds the products write lock across check and write, so
/// concurrent callers serialize exactly like rows under the conditional
/// UPDATE.
#[derive(Clone, Default)]
pub struct InMemoryCommerceStore {
    categories: Arc<RwLock<HashMap<CategoryId, CategoryRecord>>>,
    products: Arc<RwLock<HashMap<ProductId, ProductRecord>>>,
    carts: Arc<RwLock<HashMap<CartId, CartRecord>>>,
    cart_items: Arc<RwLock<HashMap<CartItemId, CartItemRecord>>>,
    orders: Arc<RwLock<HashMap<OrderId, OrderRecord>>>,
    order_items: Arc<RwLock<HashMap<OrderItemId, OrderItemRecord>>>,
    payments: Arc<RwLock<HashMap<PaymentId, PaymentRecord>>>,
}

impl InMemoryCommerceStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.categories.write().await.clear();
        self.products.write().await.clear();
        self.carts.write().await.clear();
        self.cart_items.write().await.clear();
        self.orders.write().await.clear();
        self.order_items.write().await.clear();
        self.payments.write().await.clear();
    }
}

#[async_trait]
impl CommerceStore for InMemoryCommerceStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_category(&self, category: CategoryRecord) -> Result<()> {
        let mut categories = self.categories.write().await;
        categories.insert(category.id, category);
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let categories = self.categories.read().await;
        Ok(categories.get(&id).filter(|c| c.is_active()).cloned())
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<()> {
        let mut products = self.products.write().await;
        products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let products = self.products.read().await;
        Ok(products.get(&id).filter(|p| p.is_active()).cloned())
    }

    async fn decrement_product_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<ProductRecord>> {
        // Check and write under one lock, the moral equivalent of the
        // conditional UPDATE the Postgres backend runs.
        let mut products = self.products.write().await;
        match products.get_mut(&id) {
            Some(product) if product.is_active() && product.quantity >= quantity => {
                product.quantity -= quantity;
                product.updated_at = Utc::now();
                Ok(Some(product.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn increment_product_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<ProductRecord>> {
        let mut products = self.products.write().await;
        match products.get_mut(&id) {
            Some(product) if product.is_active() => {
                product.quantity += quantity;
                product.updated_at = Utc::now();
                Ok(Some(product.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn insert_cart(&self, cart: CartRecord) -> Result<()> {
        let mut carts = self.carts.write().await;
        if carts
            .values()
            .any(|c| c.user_id == cart.user_id && c.is_active())
        {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::ACTIVE_CART_PER_USER.to_string(),
            });
        }
        carts.insert(cart.id, cart);
        Ok(())
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<CartRecord>> {
        let carts = self.carts.read().await;
        Ok(carts.get(&id).filter(|c| c.is_active()).cloned())
    }

    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let carts = self.carts.read().await;
        Ok(carts
            .values()
            .find(|c| c.user_id == user_id && c.is_active())
            .cloned())
    }

    async fn update_cart_total(&self, id: CartId, total: Money) -> Result<Option<CartRecord>> {
        let mut carts = self.carts.write().await;
        match carts.get_mut(&id) {
            Some(cart) if cart.is_active() => {
                cart.total = total;
                cart.updated_at = Utc::now();
                Ok(Some(cart.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_cart_and_items(&self, id: CartId) -> Result<Option<CartRecord>> {
        let mut carts = self.carts.write().await;
        let mut cart_items = self.cart_items.write().await;

        let Some(cart) = carts.get_mut(&id).filter(|c| c.is_active()) else {
            return Ok(None);
        };

        let now = Utc::now();
        cart.deleted_at = Some(now);
        cart.updated_at = now;
        let tombstoned = cart.clone();

        for item in cart_items.values_mut() {
            if item.cart_id == id && item.is_active() {
                item.deleted_at = Some(now);
                item.updated_at = now;
            }
        }

        Ok(Some(tombstoned))
    }

    async fn insert_cart_item(&self, item: CartItemRecord) -> Result<()> {
        let mut cart_items = self.cart_items.write().await;
        if cart_items
            .values()
            .any(|i| i.cart_id == item.cart_id && i.product_id == item.product_id && i.is_active())
        {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::ACTIVE_CART_ITEM_PER_PRODUCT.to_string(),
            });
        }
        cart_items.insert(item.id, item);
        Ok(())
    }

    async fn get_cart_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>> {
        let cart_items = self.cart_items.read().await;
        Ok(cart_items.get(&id).filter(|i| i.is_active()).cloned())
    }

    async fn get_cart_item_by_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let cart_items = self.cart_items.read().await;
        Ok(cart_items
            .values()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id && i.is_active())
            .cloned())
    }

    async fn list_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>> {
        let cart_items = self.cart_items.read().await;
        let mut items: Vec<_> = cart_items
            .values()
            .filter(|i| i.cart_id == cart_id && i.is_active())
            .cloned()
            .collect();
        // Oldest first, id as tiebreak for a stable listing order.
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        Ok(items)
    }

    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: u32,
    ) -> Result<Option<CartItemRecord>> {
        let mut cart_items = self.cart_items.write().await;
        match cart_items.get_mut(&id) {
            Some(item) if item.is_active() => {
                item.quantity = quantity;
                item.updated_at = Utc::now();
                Ok(Some(item.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_cart_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>> {
        let mut cart_items = self.cart_items.write().await;
        match cart_items.get_mut(&id) {
            Some(item) if item.is_active() => {
                let now = Utc::now();
                item.deleted_at = Some(now);
                item.updated_at = now;
                Ok(Some(item.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn insert_order(&self, order: OrderRecord) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn insert_order_with_items(
        &self,
        order: OrderRecord,
        items: Vec<OrderItemRecord>,
    ) -> Result<()> {
        validate_order_lines(&order, &items)?;

        let mut orders = self.orders.write().await;
        let mut order_items = self.order_items.write().await;
        orders.insert(order.id, order);
        for item in items {
            order_items.insert(item.id, item);
        }
        Ok(())
    }

    async fn insert_order_item(&self, item: OrderItemRecord) -> Result<()> {
        let mut order_items = self.order_items.write().await;
        order_items.insert(item.id, item);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        let mut result: Vec<_> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_uuid().cmp(&a.id.as_uuid()))
        });
        Ok(result)
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let order_items = self.order_items.read().await;
        let mut items: Vec<_> = order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        Ok(items)
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItemRecord>> {
        let order_items = self.order_items.read().await;
        Ok(order_items.get(&id).cloned())
    }

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()> {
        let mut payments = self.payments.write().await;
        if payments
            .values()
            .any(|p| p.user_id == payment.user_id && p.is_active())
        {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::ACTIVE_PAYMENT_PER_USER.to_string(),
            });
        }
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get_payment_by_user(&self, user_id: UserId) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .find(|p| p.user_id == user_id && p.is_active())
            .cloned())
    }
}
