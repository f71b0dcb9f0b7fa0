use ethers::prelude::*;
use log::info;
use std::sync::Arc;

use crate::execution::errors::OrderError;

abigen!(
    ProxyRegistryContract,
    r#"[
        function proxies(address) view returns (address)
        function registerProxy() returns (address)
    ]"#
);

/// The user's Wyvern proxy, if one has been registered.
pub async fn registered_proxy<M: Middleware + 'static>(
    client: Arc<M>,
    registry: Address,
    owner: Address,
) -> Result<Option<Address>, OrderError> {
    let proxy = ProxyRegistryContract::new(registry, client)
        .proxies(owner)
        .call()
        .await
        .map_err(|e| OrderError::contract("proxies", e))?;

    Ok((!proxy.is_zero()).then_some(proxy))
}

pub async fn register_proxy<M: Middleware + 'static>(
    client: Arc<M>,
    registry: Address,
) -> Result<H256, OrderError> {
    let registry = ProxyRegistryContract::new(registry, client);
    let call = registry.register_proxy();
    let pending = call
        .send()
        .await
        .map_err(|e| OrderError::contract("registerProxy", e))?;
    let tx_hash = *pending;

    pending
        .await
        .map_err(|e| OrderError::contract("registerProxy", e))?
        .ok_or_else(|| OrderError::contract("registerProxy", "transaction dropped"))?;

    info!("✅ Proxy registered. Tx: {:#x}", tx_hash);
    Ok(tx_hash)
}
