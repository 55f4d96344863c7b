//! Checkout orchestrator driving the purchase flows.

use std::time::Instant;

use commerce_store::CommerceStore;
use common::{ProductId, UserId};
use domain::{
    CartAggregator, Catalog, CommerceError, OrderAssembler, OrderLine, OrderWithItems, PaymentGate,
    StockLedger,
};

use crate::attempt::CheckoutAttempt;

/// Orchestrates checkout across the payment, cart, stock and order services.
///
/// Both flows walk guard → source → commit → assemble, with the cart flow
/// clearing the cart at the end. Stock commits one line at a time, so a
/// failure mid-way restocks the already committed lines in reverse order and
/// surfaces the original error. Assembly is a single storage transaction, so
/// no order row survives a failed attempt.
pub struct CheckoutOrchestrator<S: CommerceStore> {
    payments: PaymentGate<S>,
    catalog: Catalog<S>,
    carts: CartAggregator<S>,
    stock: StockLedger<S>,
    orders: OrderAssembler<S>,
}

impl<S: CommerceStore + Clone> CheckoutOrchestrator<S> {
    /// Creates a new orchestrator over one store.
    pub fn new(store: S) -> Self {
        Self {
            payments: PaymentGate::new(store.clone()),
            catalog: Catalog::new(store.clone()),
            carts: CartAggregator::new(store.clone()),
            stock: StockLedger::new(store.clone()),
            orders: OrderAssembler::new(store),
        }
    }

    /// Purchases the entire active cart of a user.
    ///
    /// The order is priced at the refreshed cart total, stock commits per
    /// line in listing order, and the cart is retired once the order is
    /// persisted. Fails with [`CommerceError::CartEmpty`] before anything is
    /// written if the cart has no active items.
    #[tracing::instrument(skip(self), fields(flow = "cart"))]
    pub async fn purchase_cart(&self, user_id: UserId) -> Result<OrderWithItems, CommerceError> {
        metrics::counter!("checkout_executions_total").increment(1);
        let checkout_start = Instant::now();
        let mut attempt = CheckoutAttempt::new(user_id);

        tracing::info!(step = "guard", "checkout step started");
        if let Err(e) = self.payments.require_payment(user_id).await {
            return Err(self.abort(&mut attempt, checkout_start, e));
        }
        attempt.mark_guarded();

        tracing::info!(step = "source", "checkout step started");
        let sourced = match self.carts.list_items(user_id).await {
            Ok(sourced) if sourced.items.is_empty() => {
                return Err(self.abort(&mut attempt, checkout_start, CommerceError::CartEmpty));
            }
            Ok(sourced) => sourced,
            Err(e) => return Err(self.abort(&mut attempt, checkout_start, e)),
        };
        attempt.mark_sourced();

        let lines: Vec<OrderLine> = sourced
            .items
            .iter()
            .map(|item| OrderLine::new(item.product_id, item.quantity))
            .collect();

        for line in &lines {
            tracing::info!(
                step = "commit",
                product_id = %line.product_id,
                quantity = line.quantity,
                "checkout step started"
            );
            if let Err(e) = self.stock.sold(line.product_id, line.quantity).await {
                return Err(self.roll_back(&mut attempt, checkout_start, e).await);
            }
            attempt.record_committed(*line);
        }

        tracing::info!(step = "assemble", "checkout step started");
        let assembled = match self
            .orders
            .assemble(user_id, sourced.cart.total, lines)
            .await
        {
            Ok(assembled) => assembled,
            Err(e) => return Err(self.roll_back(&mut attempt, checkout_start, e).await),
        };
        attempt.mark_assembled();

        tracing::info!(step = "clear", "checkout step started");
        if let Err(e) = self.carts.clear(sourced.cart.id).await {
            // The order is persisted and stands; only the cart cleanup
            // failed, and the residual cart stays visible to the caller.
            tracing::warn!(
                %user_id,
                order_id = %assembled.order.id,
                reason = %e,
                "cart not cleared after assembly"
            );
            return Err(self.abort(&mut attempt, checkout_start, e));
        }
        attempt.mark_cleared();
        attempt.mark_done();

        let duration = checkout_start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("checkout_completed").increment(1);
        tracing::info!(%user_id, order_id = %assembled.order.id, duration, "checkout completed");

        Ok(assembled)
    }

    /// Purchases a single product directly, without a cart.
    ///
    /// The order is priced as the product's current price times the claimed
    /// quantity, read before the stock commit.
    #[tracing::instrument(skip(self), fields(flow = "product"))]
    pub async fn purchase_one(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<OrderWithItems, CommerceError> {
        metrics::counter!("checkout_executions_total").increment(1);
        let checkout_start = Instant::now();
        let mut attempt = CheckoutAttempt::new(user_id);

        tracing::info!(step = "guard", "checkout step started");
        if let Err(e) = self.payments.require_payment(user_id).await {
            return Err(self.abort(&mut attempt, checkout_start, e));
        }
        attempt.mark_guarded();

        tracing::info!(step = "source", "checkout step started");
        let product = match self.catalog.get_product(product_id).await {
            Ok(product) => product,
            Err(e) => return Err(self.abort(&mut attempt, checkout_start, e)),
        };
        attempt.mark_sourced();

        let total = product.price.multiply(quantity);
        let line = OrderLine::new(product_id, quantity);

        tracing::info!(step = "commit", %product_id, quantity, "checkout step started");
        if let Err(e) = self.stock.sold(product_id, quantity).await {
            return Err(self.abort(&mut attempt, checkout_start, e));
        }
        attempt.record_committed(line);

        tracing::info!(step = "assemble", "checkout step started");
        let assembled = match self.orders.assemble(user_id, total, vec![line]).await {
            Ok(assembled) => assembled,
            Err(e) => return Err(self.roll_back(&mut attempt, checkout_start, e).await),
        };
        attempt.mark_assembled();
        attempt.mark_done();

        let duration = checkout_start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("checkout_completed").increment(1);
        tracing::info!(%user_id, order_id = %assembled.order.id, duration, "checkout completed");

        Ok(assembled)
    }

    /// Restocks committed lines in reverse order, then fails the attempt.
    ///
    /// A restock failure supersedes the original error so the resulting
    /// inventory inconsistency is not silently swallowed; every line still
    /// gets its restock attempt.
    async fn roll_back(
        &self,
        attempt: &mut CheckoutAttempt,
        started_at: Instant,
        error: CommerceError,
    ) -> CommerceError {
        tracing::warn!(
            user_id = %attempt.user_id(),
            reason = %error,
            "checkout step failed, compensating"
        );

        let committed: Vec<OrderLine> = attempt.committed_lines().to_vec();
        let mut restock_failure = None;
        for line in committed.iter().rev() {
            match self.stock.restock(line.product_id, line.quantity).await {
                Ok(_) => {
                    tracing::info!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        "line restocked"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        reason = %e,
                        "restock failed during compensation"
                    );
                    if restock_failure.is_none() {
                        restock_failure = Some(e);
                    }
                }
            }
        }

        let surfaced = restock_failure.unwrap_or(error);
        self.abort(attempt, started_at, surfaced)
    }

    /// Fails the attempt and records the failure metrics.
    fn abort(
        &self,
        attempt: &mut CheckoutAttempt,
        started_at: Instant,
        error: CommerceError,
    ) -> CommerceError {
        attempt.mark_failed(error.to_string());
        metrics::histogram!("checkout_duration_seconds")
            .record(started_at.elapsed().as_secs_f64());
        metrics::counter!("checkout_failed").increment(1);
        tracing::warn!(user_id = %attempt.user_id(), reason = %error, "checkout failed");
        error
    }
}
