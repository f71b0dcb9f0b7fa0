//! Where an order is in its flow. The value is immutable: `advance` hands
//! back a new lifecycle and leaves the old one untouched.

use crate::execution::errors::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStage {
    Built,
    Hashed,
    Signed,
    Validated,
    Submitted,
    Cancelled,
    Rejected,
}

impl OrderStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStage::Submitted | OrderStage::Cancelled | OrderStage::Rejected
        )
    }

    fn can_advance_to(self, next: OrderStage) -> bool {
        use OrderStage::*;

        match (self, next) {
            (Built, Hashed) | (Hashed, Signed) | (Signed, Validated) | (Validated, Submitted) => {
                true
            }
            (Signed | Validated, Cancelled) => true,
            (from, Rejected) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLifecycle {
    history: Vec<OrderStage>,
}

impl OrderLifecycle {
    pub fn built() -> Self {
        Self {
            history: vec![OrderStage::Built],
        }
    }

    /// Lifecycle of an order that was already signed elsewhere, e.g. a
    /// listing fetched back from the order book.
    pub fn signed() -> Self {
        Self {
            history: vec![
                OrderStage::Built,
                OrderStage::Hashed,
                OrderStage::Signed,
            ],
        }
    }

    pub fn stage(&self) -> OrderStage {
        *self.history.last().unwrap_or(&OrderStage::Built)
    }

    pub fn history(&self) -> &[OrderStage] {
        &self.history
    }

    pub fn advance(&self, next: OrderStage) -> Result<Self, OrderError> {
        let from = self.stage();
        if !from.can_advance_to(next) {
            return Err(OrderError::IllegalTransition { from, to: next });
        }

        let mut history = self.history.clone();
        history.push(next);
        Ok(Self { history })
    }
}
