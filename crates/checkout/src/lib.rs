//! Checkout orchestration across the payment, cart, stock and order services.
//!
//! A checkout attempt walks a fixed sequence of steps:
//! 1. Guard — the buyer must have a registered payment method
//! 2. Source — price the purchase from the live cart or product row
//! 3. Commit — decrement stock per line, in listing order
//! 4. Assemble — persist the order with all its items in one transaction
//! 5. Clear — retire the cart (cart flow only)
//!
//! If a commit or assemble step fails, lines that already committed are
//! restocked in reverse order before the error surfaces.

pub mod attempt;
pub mod orchestrator;

pub use attempt::{CheckoutAttempt, CheckoutState};
pub use orchestrator::CheckoutOrchestrator;
