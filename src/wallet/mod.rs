pub mod allowance;
pub mod balance;
pub mod proxy;
pub mod signer;

pub use allowance::{ApprovalState, ChainApprovals};
pub use signer::{SigningCapability, WalletSigner};
