use ethers::types::{Address, Bytes, Signature, H256, U256};
use std::ops::Deref;

use super::TokenStandard;
use crate::execution::errors::OrderError;

// ==================================================
// WIRE ENUMS (uint8 on the contract)
// ==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SaleKind {
    FixedPrice = 0,
    DutchAuction = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeeMethod {
    ProtocolFee = 0,
    SplitFee = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HowToCall {
    Call = 0,
    DelegateCall = 1,
}

macro_rules! wire_enum {
    ($ty:ident, $field:literal, $($variant:ident = $value:literal),+) => {
        impl $ty {
            pub fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $ty {
            type Error = OrderError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($ty::$variant),)+
                    other => Err(OrderError::invalid($field, format!("unknown value {}", other))),
                }
            }
        }
    };
}

wire_enum!(Side, "side", Buy = 0, Sell = 1);
wire_enum!(SaleKind, "saleKind", FixedPrice = 0, DutchAuction = 1);
wire_enum!(FeeMethod, "feeMethod", ProtocolFee = 0, SplitFee = 1);
wire_enum!(HowToCall, "howToCall", Call = 0, DelegateCall = 1);

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// How the order is actually sold. English auctions are fixed-price
/// orders on the contract that wait for the best counter-order off-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionKind {
    FixedPrice,
    EnglishAuction,
    DutchAuction,
}

// ==================================================
// PAYMENT TOKEN
// ==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentToken {
    /// Ether, encoded as the zero address.
    Native,
    Erc20(Address),
}

impl PaymentToken {
    pub fn from_address(address: Address) -> Self {
        if address.is_zero() {
            PaymentToken::Native
        } else {
            PaymentToken::Erc20(address)
        }
    }

    pub fn address(&self) -> Address {
        match self {
            PaymentToken::Native => Address::zero(),
            PaymentToken::Erc20(token) => *token,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, PaymentToken::Native)
    }
}

// ==================================================
// ORDER INTENT
// ==================================================

/// The asset an order trades, as referenced from order metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub token_address: Address,
    pub token_id: U256,
    pub standard: TokenStandard,
}

/// Off-chain fields. The order book needs them but the contract does not
/// hash them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMetadata {
    pub asset: AssetRef,
    pub quantity: U256,
    pub maker_referrer_fee: U256,
    pub waiting_for_best_counter_order: bool,
    pub english_auction_reserve_price: Option<U256>,
}

/// An unsigned Wyvern order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub exchange: Address,
    pub maker: Address,
    pub taker: Address,
    pub maker_relayer_fee: U256,
    pub taker_relayer_fee: U256,
    pub maker_protocol_fee: U256,
    pub taker_protocol_fee: U256,
    pub fee_recipient: Address,
    pub fee_method: FeeMethod,
    pub side: Side,
    pub sale_kind: SaleKind,
    pub target: Address,
    pub how_to_call: HowToCall,
    pub calldata: Bytes,
    pub replacement_pattern: Bytes,
    pub static_target: Address,
    pub static_extradata: Bytes,
    pub payment_token: PaymentToken,
    pub base_price: U256,
    pub extra: U256,
    pub listing_time: U256,
    pub expiration_time: U256,
    pub salt: U256,
    pub metadata: OrderMetadata,
}

impl OrderIntent {
    pub fn auction_kind(&self) -> AuctionKind {
        match self.sale_kind {
            SaleKind::DutchAuction => AuctionKind::DutchAuction,
            SaleKind::FixedPrice if self.metadata.waiting_for_best_counter_order => {
                AuctionKind::EnglishAuction
            }
            SaleKind::FixedPrice => AuctionKind::FixedPrice,
        }
    }

    /// `SaleKindInterface.canSettleOrder`.
    pub fn can_settle_at(&self, now: u64) -> bool {
        let now = U256::from(now);
        self.listing_time < now && (self.expiration_time.is_zero() || now < self.expiration_time)
    }

    /// The seven address slots in contract order.
    pub fn addresses(&self) -> [Address; 7] {
        [
            self.exchange,
            self.maker,
            self.taker,
            self.fee_recipient,
            self.target,
            self.static_target,
            self.payment_token.address(),
        ]
    }

    /// The nine uint slots in contract order.
    pub fn uints(&self) -> [U256; 9] {
        [
            self.maker_relayer_fee,
            self.taker_relayer_fee,
            self.maker_protocol_fee,
            self.taker_protocol_fee,
            self.base_price,
            self.extra,
            self.listing_time,
            self.expiration_time,
            self.salt,
        ]
    }

    /// feeMethod, side, saleKind, howToCall.
    pub fn enums(&self) -> [u8; 4] {
        [
            self.fee_method.as_u8(),
            self.side.as_u8(),
            self.sale_kind.as_u8(),
            self.how_to_call.as_u8(),
        ]
    }
}

// ==================================================
// HASHED / SIGNED
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedOrder {
    pub intent: OrderIntent,
    pub hash: H256,
}

impl Deref for HashedOrder {
    type Target = OrderIntent;

    fn deref(&self) -> &OrderIntent {
        &self.intent
    }
}

/// `v`, `r`, `s` as the contract takes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSignature {
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl OrderSignature {
    /// Empty signature, used for a taker's own order which the contract
    /// accepts because `msg.sender == maker`.
    pub fn empty() -> Self {
        Self {
            v: 0,
            r: H256::zero(),
            s: H256::zero(),
        }
    }

    pub fn to_signature(&self) -> Signature {
        Signature {
            r: U256::from_big_endian(self.r.as_bytes()),
            s: U256::from_big_endian(self.s.as_bytes()),
            v: self.v as u64,
        }
    }
}

impl From<Signature> for OrderSignature {
    fn from(sig: Signature) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        sig.r.to_big_endian(&mut r);
        sig.s.to_big_endian(&mut s);
        Self {
            v: sig.v as u8,
            r: H256::from(r),
            s: H256::from(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    pub hashed: HashedOrder,
    pub signature: OrderSignature,
}

impl Deref for SignedOrder {
    type Target = HashedOrder;

    fn deref(&self) -> &HashedOrder {
        &self.hashed
    }
}

// ==================================================
// MATCHED PAIR
// ==================================================

/// A buy and a sell that `ordersCanMatch` would accept. Only built through
/// [`MatchedPair::new`], right before submission.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    buy: SignedOrder,
    sell: SignedOrder,
}

impl MatchedPair {
    pub fn new(buy: SignedOrder, sell: SignedOrder, now: u64) -> Result<Self, OrderError> {
        let fail = |reason: &str| Err(OrderError::ValidationFailed(reason.to_string()));

        if buy.side != Side::Buy || sell.side != Side::Sell {
            return fail("orders are not on opposite sides");
        }
        if buy.exchange != sell.exchange {
            return fail("orders target different exchanges");
        }
        if buy.fee_method != sell.fee_method {
            return fail("fee methods differ");
        }
        if buy.payment_token != sell.payment_token {
            return fail("payment tokens differ");
        }
        if !sell.taker.is_zero() && sell.taker != buy.maker {
            return fail("sell order is reserved for another taker");
        }
        if !buy.taker.is_zero() && buy.taker != sell.maker {
            return fail("buy order is reserved for another maker");
        }
        if sell.fee_recipient.is_zero() == buy.fee_recipient.is_zero() {
            return fail("exactly one order must carry the fee recipient");
        }
        if buy.target != sell.target || buy.how_to_call != sell.how_to_call {
            return fail("orders call different targets");
        }
        if !buy.can_settle_at(now) || !sell.can_settle_at(now) {
            return fail("order is not within its listing window");
        }
        // Dutch prices decay below the base price; the contract computes those.
        if sell.sale_kind == SaleKind::FixedPrice && buy.base_price < sell.base_price {
            return fail("buy price is below the sell price");
        }

        // Fee relations enforced by the exchange when funds move.
        if !sell.fee_recipient.is_zero() {
            if sell.taker_relayer_fee > buy.taker_relayer_fee {
                return fail("buy order pays less taker relayer fee than the sell asks");
            }
            if sell.fee_method == FeeMethod::SplitFee
                && sell.taker_protocol_fee > buy.taker_protocol_fee
            {
                return fail("buy order pays less taker protocol fee than the sell asks");
            }
        } else {
            if buy.maker_relayer_fee > sell.taker_relayer_fee {
                return fail("sell order accepts less relayer fee than the buy charges");
            }
            if sell.fee_method == FeeMethod::SplitFee {
                if sell.payment_token.is_native() {
                    return fail("split fees on the buy side need an ERC-20 payment token");
                }
                if buy.maker_protocol_fee > sell.taker_protocol_fee {
                    return fail("sell order accepts less protocol fee than the buy charges");
                }
            }
        }

        Ok(Self { buy, sell })
    }

    pub fn buy(&self) -> &SignedOrder {
        &self.buy
    }

    pub fn sell(&self) -> &SignedOrder {
        &self.sell
    }
}
