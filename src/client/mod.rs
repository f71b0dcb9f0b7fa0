use ethers::types::{Address, U256};
use log::{info, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::ListingConfig;
use crate::domain::{Asset, CollectionFees, SaleKind, Side, SignedOrder, TokenStandard};
use crate::execution::errors::OrderError;

pub mod order_json;

pub use order_json::OrderJson;
use order_json::bps_string_or_number;

// ==================================================
// API RESPONSES
// ==================================================

#[derive(Debug, Deserialize)]
struct AssetContractResponse {
    address: Address,
    schema_name: TokenStandard,
    #[serde(default, deserialize_with = "bps_string_or_number")]
    opensea_seller_fee_basis_points: Option<u32>,
    #[serde(default, deserialize_with = "bps_string_or_number")]
    opensea_buyer_fee_basis_points: Option<u32>,
    #[serde(default, deserialize_with = "bps_string_or_number")]
    dev_seller_fee_basis_points: Option<u32>,
    #[serde(default, deserialize_with = "bps_string_or_number")]
    dev_buyer_fee_basis_points: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    token_id: String,
    name: Option<String>,
    asset_contract: AssetContractResponse,
}

impl AssetResponse {
    fn into_asset(self, defaults: &ListingConfig) -> Result<Asset, OrderError> {
        let contract = self.asset_contract;
        let token_id = U256::from_dec_str(&self.token_id)
            .map_err(|e| OrderError::OrderBook(format!("bad token id {}: {}", self.token_id, e)))?;

        Ok(Asset {
            token_address: contract.address,
            token_id,
            standard: contract.schema_name,
            name: self.name,
            fees: CollectionFees {
                opensea_seller_fee_basis_points: contract
                    .opensea_seller_fee_basis_points
                    .unwrap_or(defaults.default_seller_fee_basis_points),
                opensea_buyer_fee_basis_points: contract
                    .opensea_buyer_fee_basis_points
                    .unwrap_or(defaults.default_buyer_fee_basis_points),
                dev_seller_fee_basis_points: contract.dev_seller_fee_basis_points.unwrap_or(0),
                dev_buyer_fee_basis_points: contract.dev_buyer_fee_basis_points.unwrap_or(0),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    orders: Vec<OrderJson>,
}

// ==================================================
// ORDER QUERY
// ==================================================

#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub asset_contract_address: Address,
    pub token_id: U256,
    pub side: Option<Side>,
    pub maker: Option<Address>,
    pub sale_kind: Option<SaleKind>,
    pub limit: u32,
}

impl OrderQuery {
    /// Open sell orders for an asset, cheapest first.
    pub fn listings(asset_contract_address: Address, token_id: U256) -> Self {
        Self {
            asset_contract_address,
            token_id,
            side: Some(Side::Sell),
            maker: None,
            sale_kind: None,
            limit: 20,
        }
    }

    pub fn by_maker(mut self, maker: Address) -> Self {
        self.maker = Some(maker);
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (
                "asset_contract_address",
                format!("{:#x}", self.asset_contract_address),
            ),
            ("token_id", self.token_id.to_string()),
        ];
        if let Some(side) = self.side {
            pairs.push(("side", side.as_u8().to_string()));
        }
        if let Some(maker) = self.maker {
            pairs.push(("maker", format!("{:#x}", maker)));
        }
        if let Some(kind) = self.sale_kind {
            pairs.push(("sale_kind", kind.as_u8().to_string()));
        }
        pairs.push(("bundled", "false".to_string()));
        pairs.push(("include_bundled", "false".to_string()));
        pairs.push(("order_by", "eth_price".to_string()));
        pairs.push(("order_direction", "asc".to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

// ==================================================
// CLIENT
// ==================================================

/// HTTP client for the marketplace order book.
#[derive(Clone)]
pub struct OrderBookClient {
    client: Client,
    pub api_url: Url,
    api_key: Option<String>,
    pub read_only: bool,
}

impl OrderBookClient {
    pub fn new(api_url: &str, api_key: Option<String>, read_only: bool) -> Result<Self, OrderError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let api_url = Url::parse(api_url)
            .map_err(|e| OrderError::OrderBook(format!("bad API url {}: {}", api_url, e)))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            read_only,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, OrderError> {
        self.api_url
            .join(path)
            .map_err(|e| OrderError::OrderBook(format!("bad path {}: {}", path, e)))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-KEY", key),
            None => request,
        }
    }

    async fn checked(response: Response) -> Result<Response, OrderError> {
        let status = response.status();
        if !status.is_success() {
            let err = response.text().await.unwrap_or_default();
            return Err(OrderError::OrderBook(format!("{}: {}", status, err)));
        }
        Ok(response)
    }

    // ==================================================
    // GET ASSET
    // ==================================================
    pub async fn get_asset(
        &self,
        contract: Address,
        token_id: U256,
        defaults: &ListingConfig,
    ) -> Result<Asset, OrderError> {
        let url = self.endpoint(&format!("/api/v1/asset/{:#x}/{}/", contract, token_id))?;
        let response = self.authorized(self.client.get(url)).send().await?;
        let asset: AssetResponse = Self::checked(response).await?.json().await?;

        asset.into_asset(defaults)
    }

    // ==================================================
    // GET ORDERS
    // ==================================================

    /// Orders matching `query`. Entries whose hash does not match their
    /// fields are skipped.
    pub async fn get_orders(&self, query: &OrderQuery) -> Result<Vec<SignedOrder>, OrderError> {
        let url = self.endpoint("/wyvern/v1/orders")?;
        let response = self
            .authorized(self.client.get(url).query(&query.pairs()))
            .send()
            .await?;
        let body: OrdersResponse = Self::checked(response).await?.json().await?;

        let orders = body
            .orders
            .into_iter()
            .filter_map(|json| {
                let hash = json.hash;
                match SignedOrder::try_from(json) {
                    Ok(order) => Some(order),
                    Err(e) => {
                        warn!("⚠️  Skipping order {:#x}: {}", hash, e);
                        None
                    }
                }
            })
            .collect();
        Ok(orders)
    }

    // ==================================================
    // POST ORDER
    // ==================================================

    /// Publishes a signed order. In read-only mode the payload is only
    /// logged and `None` is returned.
    pub async fn post_order(&self, order: &SignedOrder) -> Result<Option<OrderJson>, OrderError> {
        let payload = OrderJson::from(order);

        if self.read_only {
            let body = serde_json::to_string_pretty(&payload)
                .map_err(|e| OrderError::OrderBook(e.to_string()))?;
            info!("📝 READ ONLY: would post order {:#x}\n{}", order.hash, body);
            return Ok(None);
        }

        let url = self.endpoint("/wyvern/v1/orders/post")?;
        let response = self
            .authorized(self.client.post(url).json(&payload))
            .send()
            .await?;
        let accepted: OrderJson = Self::checked(response).await?.json().await?;

        info!("📤 Order {:#x} posted", accepted.hash);
        Ok(Some(accepted))
    }
}
