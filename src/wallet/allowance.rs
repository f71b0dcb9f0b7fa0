use async_trait::async_trait;
use ethers::prelude::*;
use log::info;
use std::sync::Arc;

use super::balance::{payment_balance, Erc20Contract};
use super::proxy::{register_proxy, registered_proxy};
use crate::domain::{AssetRef, PaymentToken, TokenStandard};
use crate::execution::errors::OrderError;

abigen!(
    NftContract,
    r#"[
        function ownerOf(uint256) view returns (address)
        function balanceOf(address,uint256) view returns (uint256)
        function isApprovedForAll(address,address) view returns (bool)
        function setApprovalForAll(address,bool)
    ]"#
);

/// On-chain approval state an order depends on: the maker's proxy, asset
/// approvals for it, and payment token balance and allowance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApprovalState: Send + Sync {
    async fn proxy_for(&self, owner: Address) -> Result<Option<Address>, OrderError>;

    /// Registers a proxy for the connected account.
    async fn register_proxy(&self) -> Result<H256, OrderError>;

    /// How many units of `asset` `owner` holds.
    async fn asset_balance(&self, owner: Address, asset: &AssetRef) -> Result<U256, OrderError>;

    async fn is_approved_for_all(
        &self,
        asset: &AssetRef,
        owner: Address,
        operator: Address,
    ) -> Result<bool, OrderError>;

    async fn approve_all(&self, asset: &AssetRef, operator: Address) -> Result<H256, OrderError>;

    async fn payment_balance(&self, token: PaymentToken, owner: Address)
        -> Result<U256, OrderError>;

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, OrderError>;

    async fn approve_token(&self, token: Address, spender: Address) -> Result<H256, OrderError>;
}

pub struct ChainApprovals<M> {
    client: Arc<M>,
    proxy_registry: Address,
}

impl<M: Middleware + 'static> ChainApprovals<M> {
    pub fn new(client: Arc<M>, proxy_registry: Address) -> Self {
        Self {
            client,
            proxy_registry,
        }
    }

    fn nft(&self, asset: &AssetRef) -> NftContract<M> {
        NftContract::new(asset.token_address, self.client.clone())
    }
}

async fn mined<'a, P: JsonRpcClient>(
    method: &'static str,
    pending: PendingTransaction<'a, P>,
) -> Result<H256, OrderError> {
    let tx_hash = *pending;
    pending
        .await
        .map_err(|e| OrderError::contract(method, e))?
        .ok_or_else(|| OrderError::contract(method, "transaction dropped"))?;
    Ok(tx_hash)
}

#[async_trait]
impl<M: Middleware + 'static> ApprovalState for ChainApprovals<M> {
    async fn proxy_for(&self, owner: Address) -> Result<Option<Address>, OrderError> {
        registered_proxy(self.client.clone(), self.proxy_registry, owner).await
    }

    async fn register_proxy(&self) -> Result<H256, OrderError> {
        register_proxy(self.client.clone(), self.proxy_registry).await
    }

    async fn asset_balance(&self, owner: Address, asset: &AssetRef) -> Result<U256, OrderError> {
        let nft = self.nft(asset);
        match asset.standard {
            TokenStandard::Erc721 => {
                let holder = nft
                    .owner_of(asset.token_id)
                    .call()
                    .await
                    .map_err(|e| OrderError::contract("ownerOf", e))?;
                Ok(if holder == owner {
                    U256::one()
                } else {
                    U256::zero()
                })
            }
            TokenStandard::Erc1155 => nft
                .balance_of(owner, asset.token_id)
                .call()
                .await
                .map_err(|e| OrderError::contract("balanceOf", e)),
        }
    }

    async fn is_approved_for_all(
        &self,
        asset: &AssetRef,
        owner: Address,
        operator: Address,
    ) -> Result<bool, OrderError> {
        self.nft(asset)
            .is_approved_for_all(owner, operator)
            .call()
            .await
            .map_err(|e| OrderError::contract("isApprovedForAll", e))
    }

    async fn approve_all(&self, asset: &AssetRef, operator: Address) -> Result<H256, OrderError> {
        let nft = self.nft(asset);
        let call = nft.set_approval_for_all(operator, true);
        let pending = call
            .send()
            .await
            .map_err(|e| OrderError::contract("setApprovalForAll", e))?;
        let tx = mined("setApprovalForAll", pending).await?;

        info!("✅ Asset approved for proxy. Tx: {:#x}", tx);
        Ok(tx)
    }

    async fn payment_balance(
        &self,
        token: PaymentToken,
        owner: Address,
    ) -> Result<U256, OrderError> {
        payment_balance(self.client.clone(), token, owner).await
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, OrderError> {
        Erc20Contract::new(token, self.client.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| OrderError::contract("allowance", e))
    }

    async fn approve_token(&self, token: Address, spender: Address) -> Result<H256, OrderError> {
        let erc20 = Erc20Contract::new(token, self.client.clone());
        let call = erc20.approve(spender, U256::MAX);
        let pending = call
            .send()
            .await
            .map_err(|e| OrderError::contract("approve", e))?;
        let tx = mined("approve", pending).await?;

        info!("✅ Payment token approved. Tx: {:#x}", tx);
        Ok(tx)
    }
}
