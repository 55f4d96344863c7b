//! Checkout attempt state machine.

use serde::{Deserialize, Serialize};

use common::UserId;
use domain::OrderLine;

/// The state of a checkout attempt in its lifecycle.
///
/// State transitions:
/// ```text
/// Started ──► Guarded ──► Sourced ──► Committing ──► Assembled ──► Cleared ──► Done
/// ```
/// Committing re-enters itself once per line item. The single-product flow
/// has no cart to retire and finishes straight from Assembled. Any failed
/// step transitions to Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Attempt created, nothing verified yet.
    #[default]
    Started,

    /// The buyer's payment method is confirmed.
    Guarded,

    /// The purchase is priced from live cart or catalog data.
    Sourced,

    /// Stock decrements are in flight, one line at a time.
    Committing,

    /// The order and all its items are persisted.
    Assembled,

    /// The cart is retired.
    Cleared,

    /// The attempt finished successfully (terminal state).
    Done,

    /// A step failed and the attempt was aborted (terminal state).
    Failed,
}

impl CheckoutState {
    /// Returns true if the payment guard can run.
    pub fn can_guard(&self) -> bool {
        matches!(self, CheckoutState::Started)
    }

    /// Returns true if the purchase can be priced.
    pub fn can_source(&self) -> bool {
        matches!(self, CheckoutState::Guarded)
    }

    /// Returns true if a stock decrement can be committed.
    pub fn can_commit(&self) -> bool {
        matches!(self, CheckoutState::Sourced | CheckoutState::Committing)
    }

    /// Returns true if the order can be assembled.
    pub fn can_assemble(&self) -> bool {
        matches!(self, CheckoutState::Committing)
    }

    /// Returns true if the cart can be retired.
    pub fn can_clear(&self) -> bool {
        matches!(self, CheckoutState::Assembled)
    }

    /// Returns true if the attempt can finish.
    pub fn can_finish(&self) -> bool {
        matches!(self, CheckoutState::Assembled | CheckoutState::Cleared)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Done | CheckoutState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Started => "Started",
            CheckoutState::Guarded => "Guarded",
            CheckoutState::Sourced => "Sourced",
            CheckoutState::Committing => "Committing",
            CheckoutState::Assembled => "Assembled",
            CheckoutState::Cleared => "Cleared",
            CheckoutState::Done => "Done",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one checkout attempt through its steps.
///
/// The orchestrator records every successful stock decrement here so that a
/// later failure can restock exactly those lines, newest first.
#[derive(Debug, Clone)]
pub struct CheckoutAttempt {
    user_id: UserId,
    state: CheckoutState,
    committed: Vec<OrderLine>,
    failure: Option<String>,
}

impl CheckoutAttempt {
    /// Creates a fresh attempt for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: CheckoutState::default(),
            committed: Vec::new(),
            failure: None,
        }
    }

    /// The user the attempt belongs to.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Current state of the attempt.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Lines whose stock decrement has committed, in commit order.
    pub fn committed_lines(&self) -> &[OrderLine] {
        &self.committed
    }

    /// Why the attempt failed, if it did.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Marks the payment guard as passed.
    pub fn mark_guarded(&mut self) {
        self.state = CheckoutState::Guarded;
    }

    /// Marks the purchase as priced.
    pub fn mark_sourced(&mut self) {
        self.state = CheckoutState::Sourced;
    }

    /// Records one committed stock decrement.
    pub fn record_committed(&mut self, line: OrderLine) {
        self.state = CheckoutState::Committing;
        self.committed.push(line);
    }

    /// Marks the order as persisted.
    pub fn mark_assembled(&mut self) {
        self.state = CheckoutState::Assembled;
    }

    /// Marks the cart as retired.
    pub fn mark_cleared(&mut self) {
        self.state = CheckoutState::Cleared;
    }

    /// Marks the attempt as finished.
    pub fn mark_done(&mut self) {
        self.state = CheckoutState::Done;
    }

    /// Marks the attempt as failed with a reason.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.state = CheckoutState::Failed;
        self.failure = Some(reason.into());
    }
}
