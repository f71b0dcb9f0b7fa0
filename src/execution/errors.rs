use thiserror::Error;

use crate::domain::lifecycle::OrderStage;

/// Everything that can stop an order flow. None of these are retried by
/// this crate; the caller decides what to do next.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed intent. Fatal for this order.
    #[error("Invalid order field `{field}`: {reason}")]
    InvalidOrderField { field: &'static str, reason: String },

    /// The signer refused or failed to sign.
    #[error("Signature declined: {0}")]
    SignatureDeclined(String),

    /// An on-chain or local precondition is not met. The caller has to
    /// remediate (approve, fund, re-register) and validate again.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unsupported sale kind: {0}")]
    UnsupportedSaleKind(String),

    /// The underlying chain call failed. May be transient.
    #[error("Contract call `{method}` failed: {reason}")]
    ContractCall { method: &'static str, reason: String },

    #[error("Order book API error: {0}")]
    OrderBook(String),

    #[error("Illegal order transition {from:?} -> {to:?}")]
    IllegalTransition { from: OrderStage, to: OrderStage },
}

impl OrderError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        OrderError::InvalidOrderField {
            field,
            reason: reason.into(),
        }
    }

    pub fn contract(method: &'static str, reason: impl std::fmt::Display) -> Self {
        OrderError::ContractCall {
            method,
            reason: reason.to_string(),
        }
    }

    /// Only chain call failures are worth retrying, and only by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderError::ContractCall { .. } | OrderError::OrderBook(_))
    }
}

impl From<reqwest::Error> for OrderError {
    fn from(e: reqwest::Error) -> Self {
        OrderError::OrderBook(e.to_string())
    }
}
