//! Persisted record types.
//!
//! These are the rows the store reads and writes, shared verbatim by the
//! in-memory and Postgres backends. Soft-deleted rows keep their data and
//! carry a `deleted_at` tombstone; every "active" query in the store
//! excludes them explicitly.

use chrono::{DateTime, Utc};
use common::{
    CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, PaymentId, ProductId, UserId,
};
use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CategoryRecord {
    /// Creates a new active category with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A catalog product. `quantity` is the available stock and never goes
/// negative; only the conditional decrement operation may reduce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProductRecord {
    /// Creates a new active product with a fresh id.
    pub fn new(
        category_id: CategoryId,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            category_id,
            name: name.into(),
            price,
            quantity,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A user's cart. At most one active cart exists per user; `total` is
/// derived from the active items and refreshed by the cart service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    pub id: CartId,
    pub user_id: UserId,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CartRecord {
    /// Creates a new active cart with total zero.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            user_id,
            total: Money::zero(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A single line inside a cart. At most one active item exists per
/// (cart, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CartItemRecord {
    /// Creates a new active cart item with a fresh id.
    pub fn new(cart_id: CartId, product_id: ProductId, quantity: u32) -> Self {
        let now = Utc::now();
        Self {
            id: CartItemId::new(),
            cart_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A persisted order. Orders are written once at checkout and never
/// mutated or deleted; `total` is the price fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a new order with a fresh id.
    pub fn new(user_id: UserId, payment_id: PaymentId, total: Money) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            payment_id,
            total,
            created_at: Utc::now(),
        }
    }
}

/// A single line of an order. The quantity here is the stock-committed
/// amount, independent of whatever the cart holds afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl OrderItemRecord {
    /// Creates a new order item with a fresh id.
    pub fn new(order_id: OrderId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            product_id,
            quantity,
            created_at: Utc::now(),
        }
    }
}

/// A registered payment method. At most one active payment exists per
/// user; `status` is the eligibility flag the checkout guard reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub user_id: UserId,
    pub provider: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    /// Creates a new active payment with a fresh id.
    pub fn new(user_id: UserId, provider: impl Into<String>, status: bool) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            user_id,
            provider: provider.into(),
            status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
