use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{
    AssetRef, FeeMethod, HashedOrder, HowToCall, OrderIntent, OrderMetadata, OrderSignature,
    PaymentToken, SaleKind, Side, SignedOrder, TokenStandard,
};
use crate::execution::errors::OrderError;
use crate::execution::hashing::order_hash;

// ==================================================
// DECIMAL STRING INTEGERS
// ==================================================

/// The order book sends integers as decimal strings, sometimes as bare
/// numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

fn parse_u256(raw: StringOrNumber) -> Result<U256, String> {
    match raw {
        StringOrNumber::Number(n) => Ok(U256::from(n)),
        StringOrNumber::String(s) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x") {
                U256::from_str_radix(hex, 16).map_err(|e| e.to_string())
            } else {
                U256::from_dec_str(s).map_err(|e| e.to_string())
            }
        }
    }
}

pub(crate) mod decimal_u256 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        parse_u256(StringOrNumber::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod decimal_u256_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Option::<StringOrNumber>::deserialize(deserializer)?
            .map(parse_u256)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

/// Basis points reported either as `250` or `"250"`.
pub(crate) fn bps_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => {
            let value = parse_u256(raw).map_err(serde::de::Error::custom)?;
            if value > U256::from(u32::MAX) {
                return Err(serde::de::Error::custom("basis points out of range"));
            }
            Ok(Some(value.as_u32()))
        }
    }
}

// ==================================================
// ORDER JSON
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetJson {
    pub id: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataJson {
    pub asset: AssetJson,
    pub schema: TokenStandard,
}

/// An order as the order book stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderJson {
    pub hash: H256,
    pub exchange: Address,
    pub maker: Address,
    pub taker: Address,
    #[serde(with = "decimal_u256")]
    pub maker_relayer_fee: U256,
    #[serde(with = "decimal_u256")]
    pub taker_relayer_fee: U256,
    #[serde(with = "decimal_u256")]
    pub maker_protocol_fee: U256,
    #[serde(with = "decimal_u256")]
    pub taker_protocol_fee: U256,
    #[serde(with = "decimal_u256", default)]
    pub maker_referrer_fee: U256,
    pub fee_recipient: Address,
    pub fee_method: u8,
    pub side: u8,
    pub sale_kind: u8,
    pub target: Address,
    pub how_to_call: u8,
    pub calldata: Bytes,
    pub replacement_pattern: Bytes,
    pub static_target: Address,
    pub static_extradata: Bytes,
    pub payment_token: Address,
    #[serde(with = "decimal_u256")]
    pub quantity: U256,
    #[serde(with = "decimal_u256")]
    pub base_price: U256,
    #[serde(with = "decimal_u256")]
    pub extra: U256,
    #[serde(with = "decimal_u256")]
    pub listing_time: U256,
    #[serde(with = "decimal_u256")]
    pub expiration_time: U256,
    #[serde(with = "decimal_u256")]
    pub salt: U256,
    pub metadata: MetadataJson,
    #[serde(default)]
    pub waiting_for_best_counter_order: bool,
    #[serde(
        with = "decimal_u256_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub english_auction_reserve_price: Option<U256>,
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl From<&SignedOrder> for OrderJson {
    fn from(order: &SignedOrder) -> Self {
        let asset = &order.metadata.asset;
        OrderJson {
            hash: order.hash,
            exchange: order.exchange,
            maker: order.maker,
            taker: order.taker,
            maker_relayer_fee: order.maker_relayer_fee,
            taker_relayer_fee: order.taker_relayer_fee,
            maker_protocol_fee: order.maker_protocol_fee,
            taker_protocol_fee: order.taker_protocol_fee,
            maker_referrer_fee: order.metadata.maker_referrer_fee,
            fee_recipient: order.fee_recipient,
            fee_method: order.fee_method.as_u8(),
            side: order.side.as_u8(),
            sale_kind: order.sale_kind.as_u8(),
            target: order.target,
            how_to_call: order.how_to_call.as_u8(),
            calldata: order.calldata.clone(),
            replacement_pattern: order.replacement_pattern.clone(),
            static_target: order.static_target,
            static_extradata: order.static_extradata.clone(),
            payment_token: order.payment_token.address(),
            quantity: order.metadata.quantity,
            base_price: order.base_price,
            extra: order.extra,
            listing_time: order.listing_time,
            expiration_time: order.expiration_time,
            salt: order.salt,
            metadata: MetadataJson {
                asset: AssetJson {
                    id: asset.token_id.to_string(),
                    address: asset.token_address,
                    quantity: match asset.standard {
                        TokenStandard::Erc1155 => Some(order.metadata.quantity.to_string()),
                        TokenStandard::Erc721 => None,
                    },
                },
                schema: asset.standard,
            },
            waiting_for_best_counter_order: order.metadata.waiting_for_best_counter_order,
            english_auction_reserve_price: order.metadata.english_auction_reserve_price,
            v: order.signature.v,
            r: order.signature.r,
            s: order.signature.s,
        }
    }
}

impl OrderJson {
    /// The unsigned order this JSON describes.
    pub fn to_intent(&self) -> Result<OrderIntent, OrderError> {
        let token_id = U256::from_dec_str(&self.metadata.asset.id)
            .map_err(|e| OrderError::invalid("metadata.asset.id", e.to_string()))?;

        Ok(OrderIntent {
            exchange: self.exchange,
            maker: self.maker,
            taker: self.taker,
            maker_relayer_fee: self.maker_relayer_fee,
            taker_relayer_fee: self.taker_relayer_fee,
            maker_protocol_fee: self.maker_protocol_fee,
            taker_protocol_fee: self.taker_protocol_fee,
            fee_recipient: self.fee_recipient,
            fee_method: FeeMethod::try_from(self.fee_method)?,
            side: Side::try_from(self.side)?,
            sale_kind: SaleKind::try_from(self.sale_kind)?,
            target: self.target,
            how_to_call: HowToCall::try_from(self.how_to_call)?,
            calldata: self.calldata.clone(),
            replacement_pattern: self.replacement_pattern.clone(),
            static_target: self.static_target,
            static_extradata: self.static_extradata.clone(),
            payment_token: PaymentToken::from_address(self.payment_token),
            base_price: self.base_price,
            extra: self.extra,
            listing_time: self.listing_time,
            expiration_time: self.expiration_time,
            salt: self.salt,
            metadata: OrderMetadata {
                asset: AssetRef {
                    token_address: self.metadata.asset.address,
                    token_id,
                    standard: self.metadata.schema,
                },
                quantity: self.quantity,
                maker_referrer_fee: self.maker_referrer_fee,
                waiting_for_best_counter_order: self.waiting_for_best_counter_order,
                english_auction_reserve_price: self.english_auction_reserve_price,
            },
        })
    }
}

/// Rebuilds a signed order, refusing JSON whose hash does not match its
/// fields.
impl TryFrom<OrderJson> for SignedOrder {
    type Error = OrderError;

    fn try_from(json: OrderJson) -> Result<Self, Self::Error> {
        let intent = json.to_intent()?;
        let hash = order_hash(&intent)?;
        if hash != json.hash {
            return Err(OrderError::invalid(
                "hash",
                format!("reported {:#x}, fields hash to {:#x}", json.hash, hash),
            ));
        }

        Ok(SignedOrder {
            hashed: HashedOrder { intent, hash },
            signature: OrderSignature {
                v: json.v,
                r: json.r,
                s: json.s,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::hashing::hash_order;
    use crate::execution::test_support::{sample_sell_intent, seller};
    use crate::wallet::signer::{authorize_order, verify_order};

    async fn signed() -> SignedOrder {
        authorize_order(hash_order(sample_sell_intent()).unwrap(), &seller())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn payload_uses_camel_case_and_decimal_strings() {
        let order = signed().await;
        let value = serde_json::to_value(OrderJson::from(&order)).unwrap();

        assert_eq!(value["basePrice"], "100000000000000000");
        assert_eq!(value["expirationTime"], "0");
        assert_eq!(value["side"], 1);
        assert_eq!(value["feeMethod"], 1);
        assert_eq!(value["metadata"]["asset"]["id"], "1234");
        assert_eq!(value["metadata"]["schema"], "ERC721");
        assert!(value.get("englishAuctionReservePrice").is_none());
    }

    #[tokio::test]
    async fn json_restores_a_verifiable_order() {
        let order = signed().await;
        let text = serde_json::to_string(&OrderJson::from(&order)).unwrap();

        let parsed: OrderJson = serde_json::from_str(&text).unwrap();
        let restored = SignedOrder::try_from(parsed).unwrap();

        assert_eq!(restored, order);
        verify_order(&restored).unwrap();
    }

    #[tokio::test]
    async fn tampered_price_is_refused() {
        let order = signed().await;
        let mut json = OrderJson::from(&order);
        json.base_price = U256::one();

        let err = SignedOrder::try_from(json).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrderField { field: "hash", .. }
        ));
    }

    #[tokio::test]
    async fn unknown_wire_values_are_refused() {
        let order = signed().await;
        let mut json = OrderJson::from(&order);
        json.sale_kind = 7;

        assert!(matches!(
            json.to_intent(),
            Err(OrderError::InvalidOrderField {
                field: "saleKind",
                ..
            })
        ));
    }

    #[test]
    fn integers_accept_numbers_and_hex() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(with = "decimal_u256")]
            value: U256,
        }

        let from_number: Probe = serde_json::from_str(r#"{"value": 250}"#).unwrap();
        let from_hex: Probe = serde_json::from_str(r#"{"value": "0xfa"}"#).unwrap();
        let from_string: Probe = serde_json::from_str(r#"{"value": "250"}"#).unwrap();

        assert_eq!(from_number.value, U256::from(250));
        assert_eq!(from_hex.value, U256::from(250));
        assert_eq!(from_string.value, U256::from(250));
        assert!(serde_json::from_str::<Probe>(r#"{"value": "abc"}"#).is_err());
    }
}
