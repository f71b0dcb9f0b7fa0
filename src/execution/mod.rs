pub mod errors;
pub mod exchange;
pub mod factory;
pub mod hashing;
pub mod trader;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::OrderError;
pub use exchange::{ExchangeContract, WyvernExchange};
pub use hashing::hash_order;
pub use trader::{Cancellation, Fulfillment, Listing, Trader};
