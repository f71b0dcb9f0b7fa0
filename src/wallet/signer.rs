use anyhow::Result;
use async_trait::async_trait;
use ethers::prelude::*;
use log::{info, warn};

use crate::domain::{HashedOrder, OrderSignature, SignedOrder};
use crate::execution::errors::OrderError;
use crate::execution::hashing::{hash_to_sign, order_hash};

/// What the wallet's key custody exposes to us. We never see key material.
#[async_trait]
pub trait SigningCapability: Send + Sync {
    fn address(&self) -> Address;

    /// Personal-message signature (EIP-191) over `message`.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature>;
}

#[derive(Debug, Clone)]
pub struct WalletSigner {
    wallet: LocalWallet,
}

impl WalletSigner {
    pub fn new(private_key: &str, chain_id: u64) -> Result<Self> {
        let wallet: LocalWallet = private_key.parse()?;
        Ok(Self {
            wallet: wallet.with_chain_id(chain_id),
        })
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

#[async_trait]
impl SigningCapability for WalletSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        Ok(self.wallet.sign_message(message).await?)
    }
}

/// Asks the signer to authorize `order`. A refusal is the user's decision
/// and is surfaced as `SignatureDeclined` without retrying.
pub async fn authorize_order<S>(order: HashedOrder, signer: &S) -> Result<SignedOrder, OrderError>
where
    S: SigningCapability + ?Sized,
{
    if signer.address() != order.maker {
        return Err(OrderError::invalid(
            "maker",
            format!(
                "signer {:?} is not the order maker {:?}",
                signer.address(),
                order.maker
            ),
        ));
    }

    info!("✍️  Requesting signature for order {:#x}", order.hash);

    let signature = match signer.sign_message(order.hash.as_bytes()).await {
        Ok(sig) => sig,
        Err(e) => {
            warn!("❌ Signature declined for {:#x}: {}", order.hash, e);
            return Err(OrderError::SignatureDeclined(e.to_string()));
        }
    };

    Ok(SignedOrder {
        hashed: order,
        signature: OrderSignature::from(signature),
    })
}

/// Recomputes the hash from the order fields and checks that the maker
/// signed exactly that hash.
pub fn verify_order(order: &SignedOrder) -> Result<(), OrderError> {
    let hash = order_hash(&order.intent)?;
    if hash != order.hash {
        return Err(OrderError::ValidationFailed(format!(
            "order fields hash to {:#x}, not the signed {:#x}",
            hash, order.hash
        )));
    }

    let signer = order
        .signature
        .to_signature()
        .recover(hash_to_sign(hash))
        .map_err(|e| OrderError::ValidationFailed(format!("unrecoverable signature: {}", e)))?;
    if signer != order.maker {
        return Err(OrderError::ValidationFailed(format!(
            "signed by {:?}, not the maker {:?}",
            signer, order.maker
        )));
    }
    Ok(())
}
