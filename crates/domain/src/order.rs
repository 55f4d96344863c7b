//! Order assembly: immutable order creation and ownership-checked reads.

use commerce_store::{CommerceStore, OrderItemRecord, OrderRecord};
use common::{Money, OrderId, OrderItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::payment::PaymentGate;

/// One priced line of a checkout: a product and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// An order together with all of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}

/// Creates orders and serves ownership-checked order reads.
///
/// Orders are immutable once written: no update, no tombstone. The
/// assembler trusts its caller's pricing; totals are supplied, never
/// recomputed here. Every write resolves the user's payment through the
/// payment gate first.
pub struct OrderAssembler<S: CommerceStore> {
    store: S,
    payments: PaymentGate<S>,
}

impl<S: CommerceStore + Clone> OrderAssembler<S> {
    /// Creates a new order assembler over the given store.
    pub fn new(store: S) -> Self {
        Self {
            payments: PaymentGate::new(store.clone()),
            store,
        }
    }

    /// Persists a bare order row with the supplied total and returns it.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        total: Money,
    ) -> Result<OrderRecord, CommerceError> {
        let payment = self.payments.require_payment(user_id).await?;

        let order = OrderRecord::new(user_id, payment.id, total);
        self.store.insert_order(order.clone()).await?;
        Ok(order)
    }

    /// Persists an order and one item per line in a single storage
    /// transaction; either everything lands or nothing does.
    ///
    /// This is checkout's assembly step: stock for every line must already
    /// be committed before this call.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn assemble(
        &self,
        user_id: UserId,
        total: Money,
        lines: Vec<OrderLine>,
    ) -> Result<OrderWithItems, CommerceError> {
        let payment = self.payments.require_payment(user_id).await?;

        let order = OrderRecord::new(user_id, payment.id, total);
        let items: Vec<OrderItemRecord> = lines
            .iter()
            .map(|line| OrderItemRecord::new(order.id, line.product_id, line.quantity))
            .collect();

        self.store
            .insert_order_with_items(order.clone(), items.clone())
            .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Appends a single item to an existing order owned by the user.
    ///
    /// Does not touch stock.
    #[tracing::instrument(skip(self))]
    pub async fn add_order_item(
        &self,
        user_id: UserId,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<OrderItemRecord, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::validation(
                "quantity must be a positive number",
            ));
        }

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(CommerceError::Unauthorized);
        }

        let item = OrderItemRecord::new(order_id, product_id, quantity);
        self.store.insert_order_item(item.clone()).await?;
        Ok(item)
    }

    /// All orders of the user, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<OrderRecord>, CommerceError> {
        Ok(self.store.list_orders_by_user(user_id).await?)
    }

    /// Ownership-checked read of an order together with all of its items.
    #[tracing::instrument(skip(self))]
    pub async fn list_order_items(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderWithItems, CommerceError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(CommerceError::Unauthorized);
        }

        let items = self.store.list_order_items(order_id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Ownership-checked read of a single order item.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_item(
        &self,
        user_id: UserId,
        order_item_id: OrderItemId,
    ) -> Result<OrderItemRecord, CommerceError> {
        let item = self
            .store
            .get_order_item(order_item_id)
            .await?
            .ok_or(CommerceError::OrderItemNotFound)?;

        let order = self
            .store
            .get_order(item.order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(CommerceError::Unauthorized);
        }

        Ok(item)
    }
}
