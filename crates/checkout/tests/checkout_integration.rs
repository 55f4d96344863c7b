//! Integration tests for the checkout flows.

use checkout::CheckoutOrchestrator;
use commerce_store::{CommerceStore, InMemoryCommerceStore, ProductRecord};
use common::{Money, UserId};
use domain::{CartAggregator, Catalog, CommerceError, PaymentGate, StockLedger};

struct TestHarness {
    store: InMemoryCommerceStore,
    checkout: CheckoutOrchestrator<InMemoryCommerceStore>,
    carts: CartAggregator<InMemoryCommerceStore>,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryCommerceStore::new();
        let checkout = CheckoutOrchestrator::new(store.clone());
        let carts = CartAggregator::new(store.clone());
        Self {
            store,
            checkout,
            carts,
        }
    }

    async fn register_buyer(&self) -> UserId {
        let user_id = UserId::new();
        PaymentGate::new(self.store.clone())
            .register(user_id, "stripe".to_string(), true)
            .await
            .unwrap();
        user_id
    }

    async fn stock_product(&self, name: &str, price_cents: i64, quantity: u32) -> ProductRecord {
        let catalog = Catalog::new(self.store.clone());
        let category = catalog
            .add_category("Storefront".to_string())
            .await
            .unwrap();
        catalog
            .add_product(
                category.id,
                name.to_string(),
                Money::from_cents(price_cents),
                quantity,
            )
            .await
            .unwrap()
    }

    async fn stock_of(&self, product: &ProductRecord) -> u32 {
        self.store
            .get_product(product.id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }
}

#[tokio::test]
async fn test_cart_checkout_produces_priced_order() {
    let h = TestHarness::new();
    let buyer = h.register_buyer().await;
    let keyboard = h.stock_product("Keyboard", 300, 10).await;
    let monitor = h.stock_product("Monitor", 700, 5).await;

    h.carts.add_item(buyer, keyboard.id, 2).await.unwrap();
    h.carts.add_item(buyer, monitor.id, 1).await.unwrap();

    let assembled = h.checkout.purchase_cart(buyer).await.unwrap();

    // 2 x $3.00 + 1 x $7.00
    assert_eq!(assembled.order.total, Money::from_cents(1300));
    assert_eq!(assembled.order.total.to_string(), "$13.00");
    assert_eq!(assembled.items.len(), 2);
    assert_eq!(h.stock_of(&keyboard).await, 8);
    assert_eq!(h.stock_of(&monitor).await, 4);

    // The order reads back exactly as returned.
    let orders = h.store.list_orders_by_user(buyer).await.unwrap();
    assert_eq!(orders, vec![assembled.order]);
}

#[tokio::test]
async fn test_cart_is_retired_and_replaced_after_checkout() {
    let h = TestHarness::new();
    let buyer = h.register_buyer().await;
    let product = h.stock_product("Desk", 2500, 3).await;

    h.carts.add_item(buyer, product.id, 1).await.unwrap();
    let before = h.carts.list_items(buyer).await.unwrap();

    h.checkout.purchase_cart(buyer).await.unwrap();

    // A fresh cart replaces the retired one and can be filled again.
    let after = h.carts.list_items(buyer).await.unwrap();
    assert_ne!(after.cart.id, before.cart.id);
    assert!(after.items.is_empty());
    assert!(after.cart.total.is_zero());

    h.carts.add_item(buyer, product.id, 1).await.unwrap();
    let refilled = h.checkout.purchase_cart(buyer).await.unwrap();
    assert_eq!(refilled.order.total, Money::from_cents(2500));
    assert_eq!(h.stock_of(&product).await, 1);
}

#[tokio::test]
async fn test_single_product_checkout_prices_at_read_time() {
    let h = TestHarness::new();
    let buyer = h.register_buyer().await;
    let product = h.stock_product("Lamp", 500, 10).await;

    let assembled = h.checkout.purchase_one(buyer, product.id, 4).await.unwrap();

    assert_eq!(assembled.order.total, Money::from_cents(2000));
    assert_eq!(assembled.items.len(), 1);
    assert_eq!(h.stock_of(&product).await, 6);
}

#[tokio::test]
async fn test_overclaim_fails_and_leaves_stock_untouched() {
    let h = TestHarness::new();
    let buyer = h.register_buyer().await;
    let product = h.stock_product("Chair", 900, 10).await;

    let err = h
        .checkout
        .purchase_one(buyer, product.id, 20)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("ProductId {} has 10 items. claimed 20 items", product.id)
    );
    assert_eq!(h.stock_of(&product).await, 10);
    assert!(h.store.list_orders_by_user(buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_cart_checkout_leaves_no_order() {
    let h = TestHarness::new();
    let buyer = h.register_buyer().await;

    let err = h.checkout.purchase_cart(buyer).await.unwrap_err();

    assert!(matches!(err, CommerceError::CartEmpty));
    assert!(h.store.list_orders_by_user(buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_line_restocks_and_checkout_can_retry() {
    let h = TestHarness::new();
    let buyer = h.register_buyer().await;
    let keyboard = h.stock_product("Keyboard", 300, 10).await;
    let monitor = h.stock_product("Monitor", 700, 1).await;

    h.carts.add_item(buyer, keyboard.id, 2).await.unwrap();
    h.carts.add_item(buyer, monitor.id, 1).await.unwrap();

    // The last monitor sells elsewhere before this checkout commits.
    let ledger = StockLedger::new(h.store.clone());
    ledger.sold(monitor.id, 1).await.unwrap();

    let err = h.checkout.purchase_cart(buyer).await.unwrap_err();
    assert!(matches!(
        err,
        CommerceError::ProductQuantityLack {
            available: 0,
            requested: 1,
            ..
        }
    ));
    assert_eq!(h.stock_of(&keyboard).await, 10);
    assert!(h.store.list_orders_by_user(buyer).await.unwrap().is_empty());

    // A return comes in; the untouched cart checks out on the retry.
    ledger.restock(monitor.id, 1).await.unwrap();
    let assembled = h.checkout.purchase_cart(buyer).await.unwrap();

    assert_eq!(assembled.order.total, Money::from_cents(1300));
    assert_eq!(h.stock_of(&keyboard).await, 8);
    assert_eq!(h.stock_of(&monitor).await, 0);
}

#[tokio::test]
async fn test_concurrent_checkouts_never_oversell() {
    let h = TestHarness::new();
    let product = h.stock_product("Limited", 500, 5).await;

    let mut buyers = Vec::new();
    for _ in 0..10 {
        let buyer = h.register_buyer().await;
        h.carts.add_item(buyer, product.id, 1).await.unwrap();
        buyers.push(buyer);
    }

    let handles: Vec<_> = buyers
        .iter()
        .map(|buyer| {
            let store = h.store.clone();
            let buyer = *buyer;
            tokio::spawn(async move {
                CheckoutOrchestrator::new(store).purchase_cart(buyer).await
            })
        })
        .collect();

    let outcomes = futures_util::future::join_all(handles).await;
    let succeeded = outcomes
        .into_iter()
        .filter(|outcome| outcome.as_ref().unwrap().is_ok())
        .count();

    assert_eq!(succeeded, 5);
    assert_eq!(h.stock_of(&product).await, 0);

    let mut orders = 0;
    for buyer in buyers {
        orders += h.store.list_orders_by_user(buyer).await.unwrap().len();
    }
    assert_eq!(orders, 5);
}
