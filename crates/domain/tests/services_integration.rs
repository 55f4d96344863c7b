//! Integration tests for the domain services over the in-memory store.
//!
//! These exercise the cross-service scenarios: cart totals staying
//! consistent with catalog prices, the stock discipline under concurrency,
//! and ownership enforcement across users.

use commerce_store::{CommerceStore, InMemoryCommerceStore, ProductRecord};
use common::{Money, UserId};
use domain::{
    CartAggregator, Catalog, CommerceError, OrderAssembler, OrderLine, PaymentGate, StockLedger,
};

async fn seed_product(
    store: &InMemoryCommerceStore,
    price_cents: i64,
    quantity: u32,
) -> ProductRecord {
    let catalog = Catalog::new(store.clone());
    let category = catalog.add_category("Test".to_string()).await.unwrap();
    catalog
        .add_product(
            category.id,
            "Widget".to_string(),
            Money::from_cents(price_cents),
            quantity,
        )
        .await
        .unwrap()
}

mod cart_totals {
    use super::*;

    #[tokio::test]
    async fn total_tracks_adds_updates_and_removes() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();

        // productA qty 2 @ $3.00, productB qty 1 @ $7.00
        let product_a = seed_product(&store, 300, 10).await;
        let product_b = seed_product(&store, 700, 10).await;

        let item_a = carts.add_item(user_id, product_a.id, 2).await.unwrap();
        carts.add_item(user_id, product_b.id, 1).await.unwrap();

        let view = carts.list_items(user_id).await.unwrap();
        assert_eq!(view.cart.total, Money::from_cents(1300));
        assert_eq!(view.cart.total.to_string(), "$13.00");

        // 2 -> 3 units of A: 3 x 3.00 + 7.00 = 16.00
        carts.update_item(user_id, item_a.id, 3).await.unwrap();
        let view = carts.list_items(user_id).await.unwrap();
        assert_eq!(view.cart.total, Money::from_cents(1600));

        // Drop A entirely: 7.00 left
        carts.remove_item(user_id, item_a.id).await.unwrap();
        let view = carts.list_items(user_id).await.unwrap();
        assert_eq!(view.cart.total, Money::from_cents(700));
        assert_eq!(view.items.len(), 1);
    }

    #[tokio::test]
    async fn total_reflects_price_change_on_next_read() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 500, 10).await;

        carts.add_item(user_id, product.id, 2).await.unwrap();
        assert_eq!(
            carts.list_items(user_id).await.unwrap().cart.total,
            Money::from_cents(1000)
        );

        let repriced = ProductRecord {
            price: Money::from_cents(450),
            ..product.clone()
        };
        store.insert_product(repriced).await.unwrap();

        assert_eq!(
            carts.list_items(user_id).await.unwrap().cart.total,
            Money::from_cents(900)
        );
    }
}

mod stock_discipline {
    use super::*;

    #[tokio::test]
    async fn quantity_lack_reports_exact_counts() {
        let store = InMemoryCommerceStore::new();
        let ledger = StockLedger::new(store.clone());
        let product = seed_product(&store, 500, 10).await;

        let err = ledger.sold(product.id, 20).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("ProductId {} has 10 items. claimed 20 items", product.id)
        );
        assert_eq!(
            store.get_product(product.id).await.unwrap().unwrap().quantity,
            10
        );
    }

    #[tokio::test]
    async fn concurrent_sold_never_oversells() {
        let store = InMemoryCommerceStore::new();
        let product = seed_product(&store, 500, 5).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            let product_id = product.id;
            handles.push(tokio::spawn(async move {
                StockLedger::new(store).sold(product_id, 1).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(
            store.get_product(product.id).await.unwrap().unwrap().quantity,
            0
        );
    }

    #[tokio::test]
    async fn sold_then_restock_round_trips() {
        let store = InMemoryCommerceStore::new();
        let ledger = StockLedger::new(store.clone());
        let product = seed_product(&store, 500, 10).await;

        ledger.sold(product.id, 4).await.unwrap();
        ledger.sold(product.id, 3).await.unwrap();
        ledger.restock(product.id, 3).await.unwrap();
        let restored = ledger.restock(product.id, 4).await.unwrap();

        assert_eq!(restored.quantity, 10);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn cart_item_of_another_user_is_untouchable() {
        let store = InMemoryCommerceStore::new();
        let carts = CartAggregator::new(store.clone());
        let owner = UserId::new();
        let intruder = UserId::new();
        let product = seed_product(&store, 300, 10).await;

        let item = carts.add_item(owner, product.id, 2).await.unwrap();

        let update = carts.update_item(intruder, item.id, 9).await;
        assert!(matches!(update, Err(CommerceError::Unauthorized)));

        let remove = carts.remove_item(intruder, item.id).await;
        assert!(matches!(remove, Err(CommerceError::Unauthorized)));

        // The owner's line is exactly as it was.
        let unchanged = store.get_cart_item(item.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, 2);
        assert!(unchanged.deleted_at.is_none());
    }

    #[tokio::test]
    async fn orders_of_another_user_are_unreadable() {
        let store = InMemoryCommerceStore::new();
        let orders = OrderAssembler::new(store.clone());
        let owner = UserId::new();
        let intruder = UserId::new();
        PaymentGate::new(store.clone())
            .register(owner, "toss".to_string(), true)
            .await
            .unwrap();
        let product = seed_product(&store, 500, 10).await;

        let assembled = orders
            .assemble(
                owner,
                Money::from_cents(1000),
                vec![OrderLine::new(product.id, 2)],
            )
            .await
            .unwrap();

        let detail = orders.list_order_items(intruder, assembled.order.id).await;
        assert!(matches!(detail, Err(CommerceError::Unauthorized)));

        let item = orders
            .get_order_item(intruder, assembled.items[0].id)
            .await;
        assert!(matches!(item, Err(CommerceError::Unauthorized)));

        assert!(orders.list_orders(intruder).await.unwrap().is_empty());
    }
}

mod order_flow {
    use super::*;

    #[tokio::test]
    async fn assembled_order_reads_back_with_items() {
        let store = InMemoryCommerceStore::new();
        let orders = OrderAssembler::new(store.clone());
        let user_id = UserId::new();
        PaymentGate::new(store.clone())
            .register(user_id, "toss".to_string(), true)
            .await
            .unwrap();
        let product_a = seed_product(&store, 300, 10).await;
        let product_b = seed_product(&store, 700, 10).await;

        let assembled = orders
            .assemble(
                user_id,
                Money::from_cents(1300),
                vec![
                    OrderLine::new(product_a.id, 2),
                    OrderLine::new(product_b.id, 1),
                ],
            )
            .await
            .unwrap();

        let view = orders
            .list_order_items(user_id, assembled.order.id)
            .await
            .unwrap();

        assert_eq!(view.order, assembled.order);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].product_id, product_a.id);
        assert_eq!(view.items[1].product_id, product_b.id);

        let single = orders
            .get_order_item(user_id, view.items[1].id)
            .await
            .unwrap();
        assert_eq!(single.quantity, 1);
    }

    #[tokio::test]
    async fn create_order_requires_payment_gate() {
        let store = InMemoryCommerceStore::new();
        let orders = OrderAssembler::new(store.clone());
        let user_id = UserId::new();

        let before = orders.create_order(user_id, Money::from_cents(100)).await;
        assert!(matches!(before, Err(CommerceError::PaymentNotFound)));

        PaymentGate::new(store.clone())
            .register(user_id, "toss".to_string(), true)
            .await
            .unwrap();

        let order = orders
            .create_order(user_id, Money::from_cents(100))
            .await
            .unwrap();
        assert_eq!(orders.list_orders(user_id).await.unwrap(), vec![order]);
    }
}
