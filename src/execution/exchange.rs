//! The Wyvern exchange contract as seen by the order flows.
//!
//! Argument packing follows the deployed ABI exactly: a single order goes
//! out as `addrs[7]`, `uints[9]`, four `uint8` enums and three byte
//! arrays; a match goes out as `addrs[14]`, `uints[18]`, `uint8[8]`, six
//! byte arrays, `vs[2]` and `rssMetadata[5]`, buy side first.

use async_trait::async_trait;
use ethers::abi::{parse_abi, Abi, Token};
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, H256, U256, U64};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::{MatchedPair, OrderIntent, OrderSignature, SignedOrder};
use crate::execution::errors::OrderError;

const EXCHANGE_ABI: &[&str] = &[
    "function validateOrderParameters_(address[7],uint256[9],uint8,uint8,uint8,uint8,bytes,bytes,bytes) view returns (bool)",
    "function validateOrder_(address[7],uint256[9],uint8,uint8,uint8,uint8,bytes,bytes,bytes,uint8,bytes32,bytes32) view returns (bool)",
    "function cancelledOrFinalized(bytes32) view returns (bool)",
    "function calculateMatchPrice_(address[14],uint256[18],uint8[8],bytes,bytes,bytes,bytes,bytes,bytes) view returns (uint256)",
    "function atomicMatch_(address[14],uint256[18],uint8[8],bytes,bytes,bytes,bytes,bytes,bytes,uint8[2],bytes32[5]) payable",
    "function cancelOrder_(address[7],uint256[9],uint8,uint8,uint8,uint8,bytes,bytes,bytes,uint8,bytes32,bytes32)",
];

/// Read and write calls against the deployed exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeContract: Send + Sync {
    fn address(&self) -> Address;

    async fn validate_order_parameters(&self, order: &OrderIntent) -> Result<bool, OrderError>;

    async fn validate_order(&self, order: &SignedOrder) -> Result<bool, OrderError>;

    async fn cancelled_or_finalized(&self, hash: H256) -> Result<bool, OrderError>;

    async fn calculate_match_price(&self, pair: &MatchedPair) -> Result<U256, OrderError>;

    /// Returns the transaction hash.
    async fn atomic_match(&self, pair: &MatchedPair, value: U256) -> Result<H256, OrderError>;

    /// Returns the transaction hash.
    async fn cancel_order(&self, order: &SignedOrder) -> Result<H256, OrderError>;
}

// ==================================================
// ARGUMENT PACKING
// ==================================================

fn address_array(addrs: &[Address]) -> Token {
    Token::FixedArray(addrs.iter().map(|a| Token::Address(*a)).collect())
}

fn uint_array(uints: &[U256]) -> Token {
    Token::FixedArray(uints.iter().map(|u| Token::Uint(*u)).collect())
}

fn uint8(v: u8) -> Token {
    Token::Uint(U256::from(v))
}

fn bytes32(h: H256) -> Token {
    Token::FixedBytes(h.as_bytes().to_vec())
}

/// `addrs[7], uints[9], feeMethod, side, saleKind, howToCall, calldata,
/// replacementPattern, staticExtradata`
pub fn order_tokens(order: &OrderIntent) -> Vec<Token> {
    let [fee_method, side, sale_kind, how_to_call] = order.enums();
    vec![
        address_array(&order.addresses()),
        uint_array(&order.uints()),
        uint8(fee_method),
        uint8(side),
        uint8(sale_kind),
        uint8(how_to_call),
        Token::Bytes(order.calldata.to_vec()),
        Token::Bytes(order.replacement_pattern.to_vec()),
        Token::Bytes(order.static_extradata.to_vec()),
    ]
}

/// `order_tokens` followed by `v, r, s`.
pub fn signed_order_tokens(order: &SignedOrder) -> Vec<Token> {
    let mut tokens = order_tokens(&order.intent);
    tokens.push(uint8(order.signature.v));
    tokens.push(bytes32(order.signature.r));
    tokens.push(bytes32(order.signature.s));
    tokens
}

/// Arguments shared by `calculateMatchPrice_` and `atomicMatch_`.
pub fn match_tokens(pair: &MatchedPair) -> Vec<Token> {
    let (buy, sell) = (&pair.buy().intent, &pair.sell().intent);

    let addrs: Vec<Address> = buy.addresses().into_iter().chain(sell.addresses()).collect();
    let uints: Vec<U256> = buy.uints().into_iter().chain(sell.uints()).collect();
    let enums: Vec<Token> = buy
        .enums()
        .into_iter()
        .chain(sell.enums())
        .map(uint8)
        .collect();

    vec![
        address_array(&addrs),
        uint_array(&uints),
        Token::FixedArray(enums),
        Token::Bytes(buy.calldata.to_vec()),
        Token::Bytes(sell.calldata.to_vec()),
        Token::Bytes(buy.replacement_pattern.to_vec()),
        Token::Bytes(sell.replacement_pattern.to_vec()),
        Token::Bytes(buy.static_extradata.to_vec()),
        Token::Bytes(sell.static_extradata.to_vec()),
    ]
}

/// `vs[2]` and `rssMetadata[5]` appended for `atomicMatch_`.
pub fn atomic_match_tokens(pair: &MatchedPair) -> Vec<Token> {
    let buy: &OrderSignature = &pair.buy().signature;
    let sell: &OrderSignature = &pair.sell().signature;

    let mut tokens = match_tokens(pair);
    tokens.push(Token::FixedArray(vec![uint8(buy.v), uint8(sell.v)]));
    tokens.push(Token::FixedArray(vec![
        bytes32(buy.r),
        bytes32(buy.s),
        bytes32(sell.r),
        bytes32(sell.s),
        // metadata, unused by this exchange
        bytes32(H256::zero()),
    ]));
    tokens
}

// ==================================================
// ETHERS IMPLEMENTATION
// ==================================================

pub struct WyvernExchange<M> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> WyvernExchange<M> {
    pub fn new(address: Address, client: Arc<M>) -> Result<Self, OrderError> {
        let abi: Abi =
            parse_abi(EXCHANGE_ABI).map_err(|e| OrderError::contract("parse_abi", e))?;
        Ok(Self {
            contract: Contract::new(address, abi, client),
        })
    }

    async fn read<D>(&self, method: &'static str, args: Vec<Token>) -> Result<D, OrderError>
    where
        D: ethers::abi::Detokenize + Send + Sync,
    {
        self.contract
            .method::<_, D>(method, Token::Tuple(args))
            .map_err(|e| OrderError::contract(method, e))?
            .call()
            .await
            .map_err(|e| OrderError::contract(method, e))
    }

    async fn write(
        &self,
        method: &'static str,
        args: Vec<Token>,
        value: Option<U256>,
    ) -> Result<H256, OrderError> {
        let mut call = self
            .contract
            .method::<_, ()>(method, Token::Tuple(args))
            .map_err(|e| OrderError::contract(method, e))?;
        if let Some(value) = value {
            call = call.value(value);
        }

        let pending = call
            .send()
            .await
            .map_err(|e| OrderError::contract(method, e))?;
        let tx_hash = *pending;
        info!("📤 {} sent: {:#x}", method, tx_hash);

        let receipt = pending
            .await
            .map_err(|e| OrderError::contract(method, e))?;

        match receipt {
            Some(r) if r.status == Some(U64::zero()) => {
                warn!("❌ {} reverted: {:#x}", method, tx_hash);
                Err(OrderError::contract(method, "transaction reverted"))
            }
            Some(_) => {
                info!("✅ {} mined: {:#x}", method, tx_hash);
                Ok(tx_hash)
            }
            None => Err(OrderError::contract(method, "transaction dropped")),
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ExchangeContract for WyvernExchange<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn validate_order_parameters(&self, order: &OrderIntent) -> Result<bool, OrderError> {
        self.read("validateOrderParameters_", order_tokens(order))
            .await
    }

    async fn validate_order(&self, order: &SignedOrder) -> Result<bool, OrderError> {
        self.read("validateOrder_", signed_order_tokens(order)).await
    }

    async fn cancelled_or_finalized(&self, hash: H256) -> Result<bool, OrderError> {
        self.read("cancelledOrFinalized", vec![bytes32(hash)]).await
    }

    async fn calculate_match_price(&self, pair: &MatchedPair) -> Result<U256, OrderError> {
        self.read("calculateMatchPrice_", match_tokens(pair)).await
    }

    async fn atomic_match(&self, pair: &MatchedPair, value: U256) -> Result<H256, OrderError> {
        self.write("atomicMatch_", atomic_match_tokens(pair), Some(value))
            .await
    }

    async fn cancel_order(&self, order: &SignedOrder) -> Result<H256, OrderError> {
        self.write("cancelOrder_", signed_order_tokens(order), None)
            .await
    }
}
