//! Builds Wyvern order intents: sell listings, and the counter-orders that
//! match an existing order.

use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::config::ExchangeConfig;
use crate::domain::{
    Asset, AssetRef, CollectionFees, FeeMethod, HowToCall, OrderIntent, OrderMetadata,
    PaymentToken, SaleKind, SignedOrder, Side, TokenStandard,
};
use crate::execution::errors::OrderError;

pub const INVERSE_BASIS_POINT: u32 = 10_000;
pub const OPENSEA_SELLER_BOUNTY_BASIS_POINTS: u32 = 100;
pub const MIN_EXPIRATION_SECONDS: u64 = 10;
pub const ORDER_MATCHING_LATENCY_SECONDS: u64 = 60 * 60 * 24 * 7;
/// Listing time offset absorbing clock skew between us and the chain.
pub const LISTING_TIME_OFFSET_SECONDS: u64 = 100;

const ERC721_TRANSFER: &str = "transferFrom(address,address,uint256)";
const ERC1155_TRANSFER: &str = "safeTransferFrom(address,address,uint256,uint256,bytes)";

// ==================================================
// PARAMETERS
// ==================================================

#[derive(Debug, Clone)]
pub struct SellOrderParams {
    pub asset: Asset,
    pub seller: Address,
    /// Zero lets anyone buy
    pub buyer: Address,
    pub start_amount: Decimal,
    /// Set for Dutch auctions
    pub end_amount: Option<Decimal>,
    /// Zero means no expiration
    pub expiration_time: u64,
    pub listing_time: Option<u64>,
    pub payment_token: PaymentToken,
    pub payment_decimals: u32,
    pub extra_bounty_basis_points: u32,
    pub wait_for_highest_bid: bool,
    pub english_auction_reserve_price: Option<Decimal>,
    /// Defaults to one
    pub quantity: Option<U256>,
}

impl SellOrderParams {
    /// A never-expiring, fixed-price listing paid in ether.
    pub fn fixed_price(asset: Asset, seller: Address, price: Decimal) -> Self {
        Self {
            asset,
            seller,
            buyer: Address::zero(),
            start_amount: price,
            end_amount: None,
            expiration_time: 0,
            listing_time: None,
            payment_token: PaymentToken::Native,
            payment_decimals: 18,
            extra_bounty_basis_points: 0,
            wait_for_highest_bid: false,
            english_auction_reserve_price: None,
            quantity: None,
        }
    }
}

// ==================================================
// AMOUNTS
// ==================================================

/// Converts a token amount to base units without going through floats.
pub fn to_base_units(
    amount: Decimal,
    decimals: u32,
    field: &'static str,
) -> Result<U256, OrderError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(OrderError::invalid(field, "must be a number >= 0"));
    }

    let scale = 10u128
        .checked_pow(decimals)
        .and_then(Decimal::from_u128)
        .ok_or_else(|| OrderError::invalid(field, format!("{} decimals is too many", decimals)))?;

    let scaled = amount
        .checked_mul(scale)
        .ok_or_else(|| OrderError::invalid(field, "amount overflows"))?;

    if !scaled.fract().is_zero() {
        return Err(OrderError::invalid(
            field,
            format!("more precision than {} decimals", decimals),
        ));
    }

    scaled
        .to_u128()
        .map(U256::from)
        .ok_or_else(|| OrderError::invalid(field, "amount overflows"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceParameters {
    pub base_price: U256,
    pub extra: U256,
    pub reserve_price: Option<U256>,
}

pub fn price_parameters(
    side: Side,
    params: &SellOrderParams,
) -> Result<PriceParameters, OrderError> {
    let start = params.start_amount;
    if start.is_sign_negative() && !start.is_zero() {
        return Err(OrderError::invalid("basePrice", "starting price must be >= 0"));
    }

    let price_diff = match params.end_amount {
        Some(end) if end.is_sign_negative() && !end.is_zero() => {
            return Err(OrderError::invalid("extra", "end price must be >= 0"))
        }
        Some(end) => start
            .checked_sub(end)
            .ok_or_else(|| OrderError::invalid("extra", "price difference overflows"))?,
        None => Decimal::ZERO,
    };
    let is_ether = params.payment_token.is_native();

    if is_ether && params.wait_for_highest_bid {
        return Err(OrderError::invalid(
            "paymentToken",
            "English auctions must use wrapped ETH or an ERC-20 token",
        ));
    }
    if is_ether && side == Side::Buy {
        return Err(OrderError::invalid(
            "paymentToken",
            "offers must use wrapped ETH or an ERC-20 token",
        ));
    }
    if price_diff.is_sign_negative() && !price_diff.is_zero() {
        return Err(OrderError::invalid(
            "extra",
            "end price must be less than or equal to the start price",
        ));
    }
    if !price_diff.is_zero() && params.expiration_time == 0 {
        return Err(OrderError::invalid(
            "expirationTime",
            "expiration time must be set if the order changes in price",
        ));
    }

    let reserve_price = match params.english_auction_reserve_price {
        Some(_) if !params.wait_for_highest_bid => {
            return Err(OrderError::invalid(
                "englishAuctionReservePrice",
                "reserve prices may only be set on English auctions",
            ))
        }
        Some(reserve) if reserve < start => {
            return Err(OrderError::invalid(
                "englishAuctionReservePrice",
                "reserve price must be greater than or equal to the start amount",
            ))
        }
        Some(reserve) => Some(to_base_units(
            reserve,
            params.payment_decimals,
            "englishAuctionReservePrice",
        )?),
        None => None,
    };

    Ok(PriceParameters {
        base_price: to_base_units(start, params.payment_decimals, "basePrice")?,
        extra: to_base_units(price_diff, params.payment_decimals, "extra")?,
        reserve_price,
    })
}

// ==================================================
// TIME
// ==================================================

/// Returns `(listing_time, expiration_time)`.
pub fn time_parameters(
    expiration_time: u64,
    listing_time: Option<u64>,
    waiting_for_best_counter_order: bool,
    now: u64,
) -> Result<(U256, U256), OrderError> {
    let min_expiration = now + MIN_EXPIRATION_SECONDS;

    if expiration_time != 0 && expiration_time < min_expiration {
        return Err(OrderError::invalid(
            "expirationTime",
            format!(
                "must be at least {} seconds from now, or zero (non-expiring)",
                MIN_EXPIRATION_SECONDS
            ),
        ));
    }
    if let Some(listing) = listing_time {
        if listing < now {
            return Err(OrderError::invalid("listingTime", "cannot be in the past"));
        }
        if expiration_time != 0 && listing >= expiration_time {
            return Err(OrderError::invalid(
                "listingTime",
                "must be before the expiration time",
            ));
        }
    }
    if waiting_for_best_counter_order && expiration_time == 0 {
        return Err(OrderError::invalid(
            "expirationTime",
            "English auctions must have an expiration time",
        ));
    }
    if waiting_for_best_counter_order && listing_time.is_some() {
        return Err(OrderError::invalid(
            "listingTime",
            "cannot schedule an English auction for the future",
        ));
    }

    if waiting_for_best_counter_order {
        // The auction settles at expiration; the server gets a week to match it.
        let matching_deadline = expiration_time
            .checked_add(ORDER_MATCHING_LATENCY_SECONDS)
            .ok_or_else(|| OrderError::invalid("expirationTime", "too far in the future"))?;
        Ok((U256::from(expiration_time), U256::from(matching_deadline)))
    } else {
        let listing =
            listing_time.unwrap_or_else(|| now.saturating_sub(LISTING_TIME_OFFSET_SECONDS));
        Ok((U256::from(listing), U256::from(expiration_time)))
    }
}

// ==================================================
// FEES
// ==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
    pub total_buyer_fee_basis_points: u32,
    pub total_seller_fee_basis_points: u32,
    pub seller_bounty_basis_points: u32,
}

pub fn compute_fees(
    fees: &CollectionFees,
    side: Side,
    extra_bounty_basis_points: u32,
) -> Result<Fees, OrderError> {
    let seller_bounty_basis_points = match side {
        Side::Sell => extra_bounty_basis_points,
        Side::Buy => 0,
    };
    let max_total_bounty = fees.opensea_seller_fee_basis_points;

    let total_bounty =
        seller_bounty_basis_points.saturating_add(OPENSEA_SELLER_BOUNTY_BASIS_POINTS);
    if seller_bounty_basis_points > 0 && total_bounty > max_total_bounty {
        return Err(OrderError::invalid(
            "makerReferrerFee",
            format!(
                "total bounty exceeds the maximum for this asset type ({}%)",
                max_total_bounty as f64 / 100.0
            ),
        ));
    }

    // Saturated totals land above INVERSE_BASIS_POINT and are refused below.
    let out = Fees {
        total_buyer_fee_basis_points: fees
            .opensea_buyer_fee_basis_points
            .saturating_add(fees.dev_buyer_fee_basis_points),
        total_seller_fee_basis_points: fees
            .opensea_seller_fee_basis_points
            .saturating_add(fees.dev_seller_fee_basis_points),
        seller_bounty_basis_points,
    };

    if out.total_buyer_fee_basis_points > INVERSE_BASIS_POINT {
        return Err(OrderError::invalid("takerRelayerFee", "buyer fees exceed 100%"));
    }
    if out.total_seller_fee_basis_points > INVERSE_BASIS_POINT {
        return Err(OrderError::invalid("makerRelayerFee", "seller fees exceed 100%"));
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub maker_relayer_fee: U256,
    pub taker_relayer_fee: U256,
    pub maker_referrer_fee: U256,
    pub fee_recipient: Address,
}

pub fn sell_fee_parameters(
    fees: &Fees,
    wait_for_highest_bid: bool,
    fee_recipient: Address,
) -> FeeParameters {
    // English auction listings are takers: the winning bid carries the
    // fee recipient and the maker/taker fees swap.
    let (maker, taker, recipient) = if wait_for_highest_bid {
        (
            fees.total_buyer_fee_basis_points,
            fees.total_seller_fee_basis_points,
            Address::zero(),
        )
    } else {
        (
            fees.total_seller_fee_basis_points,
            fees.total_buyer_fee_basis_points,
            fee_recipient,
        )
    };

    FeeParameters {
        maker_relayer_fee: U256::from(maker),
        taker_relayer_fee: U256::from(taker),
        maker_referrer_fee: U256::from(fees.seller_bounty_basis_points),
        fee_recipient: recipient,
    }
}

// ==================================================
// TRANSFER CALLDATA
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    pub target: Address,
    pub calldata: Bytes,
    pub replacement_pattern: Bytes,
}

fn encode_transfer(asset: &AssetRef, quantity: U256, from: Address, to: Address) -> Bytes {
    let (signature, tokens) = match asset.standard {
        TokenStandard::Erc721 => (
            ERC721_TRANSFER,
            vec![
                Token::Address(from),
                Token::Address(to),
                Token::Uint(asset.token_id),
            ],
        ),
        TokenStandard::Erc1155 => (
            ERC1155_TRANSFER,
            vec![
                Token::Address(from),
                Token::Address(to),
                Token::Uint(asset.token_id),
                Token::Uint(quantity),
                Token::Bytes(Vec::new()),
            ],
        ),
    };

    let mut data = id(signature).to_vec();
    data.extend(encode(&tokens));
    Bytes::from(data)
}

/// Mask that lets the counter-order overwrite argument word `word`.
fn replacement_pattern(len: usize, word: usize) -> Bytes {
    let mut pattern = vec![0u8; len];
    let start = 4 + 32 * word;
    pattern[start..start + 32].fill(0xff);
    Bytes::from(pattern)
}

/// Seller side: `from` is the seller, `to` is left for the buyer.
pub fn encode_sell(asset: &AssetRef, quantity: U256, seller: Address) -> TransferCall {
    let calldata = encode_transfer(asset, quantity, seller, Address::zero());
    TransferCall {
        target: asset.token_address,
        replacement_pattern: replacement_pattern(calldata.len(), 1),
        calldata,
    }
}

/// Buyer side: `to` is the recipient, `from` is left for the seller.
pub fn encode_buy(asset: &AssetRef, quantity: U256, recipient: Address) -> TransferCall {
    let calldata = encode_transfer(asset, quantity, Address::zero(), recipient);
    TransferCall {
        target: asset.token_address,
        replacement_pattern: replacement_pattern(calldata.len(), 0),
        calldata,
    }
}

pub fn generate_salt() -> U256 {
    U256::from_big_endian(&::rand::random::<[u8; 32]>())
}

// ==================================================
// ORDERS
// ==================================================

pub fn build_sell_order(
    params: &SellOrderParams,
    exchange: &ExchangeConfig,
    now: u64,
) -> Result<OrderIntent, OrderError> {
    if params.seller.is_zero() {
        return Err(OrderError::invalid("maker", "seller address is empty"));
    }

    let prices = price_parameters(Side::Sell, params)?;
    let (listing_time, expiration_time) = time_parameters(
        params.expiration_time,
        params.listing_time,
        params.wait_for_highest_bid,
        now,
    )?;
    let fees = compute_fees(
        &params.asset.fees,
        Side::Sell,
        params.extra_bounty_basis_points,
    )?;
    let fee_params = sell_fee_parameters(&fees, params.wait_for_highest_bid, exchange.fee_recipient);

    let quantity = params.quantity.unwrap_or_else(U256::one);
    if quantity.is_zero() {
        return Err(OrderError::invalid("quantity", "must be at least one"));
    }
    if params.asset.standard == TokenStandard::Erc721 && quantity != U256::one() {
        return Err(OrderError::invalid("quantity", "ERC-721 assets are unique"));
    }

    let asset = params.asset.reference();
    let transfer = encode_sell(&asset, quantity, params.seller);
    let sale_kind = if prices.extra.is_zero() {
        SaleKind::FixedPrice
    } else {
        SaleKind::DutchAuction
    };

    Ok(OrderIntent {
        exchange: exchange.exchange_address,
        maker: params.seller,
        taker: params.buyer,
        maker_relayer_fee: fee_params.maker_relayer_fee,
        taker_relayer_fee: fee_params.taker_relayer_fee,
        maker_protocol_fee: U256::zero(),
        taker_protocol_fee: U256::zero(),
        fee_recipient: fee_params.fee_recipient,
        fee_method: FeeMethod::SplitFee,
        side: Side::Sell,
        sale_kind,
        target: transfer.target,
        how_to_call: HowToCall::Call,
        calldata: transfer.calldata,
        replacement_pattern: transfer.replacement_pattern,
        static_target: Address::zero(),
        static_extradata: Bytes::default(),
        payment_token: params.payment_token,
        base_price: prices.base_price,
        extra: prices.extra,
        listing_time,
        expiration_time,
        salt: generate_salt(),
        metadata: OrderMetadata {
            asset,
            quantity,
            maker_referrer_fee: fee_params.maker_referrer_fee,
            waiting_for_best_counter_order: params.wait_for_highest_bid,
            english_auction_reserve_price: prices.reserve_price,
        },
    })
}

/// Counter-order for `order`, made by `account` with the asset going to
/// `recipient`. `offer` raises the price of a bid above the base price.
pub fn build_matching_order(
    order: &OrderIntent,
    account: Address,
    recipient: Address,
    offer: Option<U256>,
    exchange: &ExchangeConfig,
    now: u64,
) -> Result<OrderIntent, OrderError> {
    if account.is_zero() {
        return Err(OrderError::invalid("maker", "account address is empty"));
    }

    let asset = &order.metadata.asset;
    let quantity = order.metadata.quantity;
    let transfer = match order.side {
        Side::Buy => encode_sell(asset, quantity, account),
        Side::Sell => encode_buy(asset, quantity, recipient),
    };

    let base_price = match (order.side, offer) {
        (_, None) => order.base_price,
        (Side::Sell, Some(offer)) if offer >= order.base_price => offer,
        (Side::Sell, Some(_)) => {
            return Err(OrderError::invalid(
                "basePrice",
                "offer is below the listing's base price",
            ))
        }
        (Side::Buy, Some(_)) => {
            return Err(OrderError::invalid(
                "basePrice",
                "cannot change the price when accepting an offer",
            ))
        }
    };

    let fee_recipient = if order.fee_recipient.is_zero() {
        exchange.fee_recipient
    } else {
        Address::zero()
    };
    let (listing_time, expiration_time) = time_parameters(0, None, false, now)?;

    Ok(OrderIntent {
        exchange: order.exchange,
        maker: account,
        taker: order.maker,
        maker_relayer_fee: order.maker_relayer_fee,
        taker_relayer_fee: order.taker_relayer_fee,
        maker_protocol_fee: order.maker_protocol_fee,
        taker_protocol_fee: order.taker_protocol_fee,
        fee_recipient,
        fee_method: order.fee_method,
        side: order.side.opposite(),
        sale_kind: SaleKind::FixedPrice,
        target: transfer.target,
        how_to_call: order.how_to_call,
        calldata: transfer.calldata,
        replacement_pattern: transfer.replacement_pattern,
        static_target: Address::zero(),
        static_extradata: Bytes::default(),
        payment_token: order.payment_token,
        base_price,
        extra: U256::zero(),
        listing_time,
        expiration_time,
        salt: generate_salt(),
        metadata: OrderMetadata {
            asset: asset.clone(),
            quantity,
            maker_referrer_fee: order.metadata.maker_referrer_fee,
            waiting_for_best_counter_order: false,
            english_auction_reserve_price: None,
        },
    })
}

/// Returns `(buy, sell)`.
pub fn assign_orders_to_sides(
    order: SignedOrder,
    matching: SignedOrder,
) -> (SignedOrder, SignedOrder) {
    match order.side {
        Side::Buy => (order, matching),
        Side::Sell => (matching, order),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::test_support::{sample_asset, seller_address, NOW};
    use rust_decimal_macros::dec;

    #[test]
    fn fixed_price_listing_defaults() {
        let cfg = ExchangeConfig::default();
        let params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(0.1));
        let order = build_sell_order(&params, &cfg, NOW).unwrap();

        assert_eq!(order.expiration_time, U256::zero());
        assert_eq!(order.payment_token.address(), Address::zero());
        assert_eq!(order.metadata.quantity, U256::one());
        assert_eq!(order.base_price, U256::from(100_000_000_000_000_000u64));
        assert_eq!(order.extra, U256::zero());
        assert_eq!(order.listing_time, U256::from(NOW - 100));
        assert_eq!(order.sale_kind, SaleKind::FixedPrice);
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.fee_method, FeeMethod::SplitFee);
        assert_eq!(order.fee_recipient, cfg.fee_recipient);
        // 250 opensea + 500 dev from the sample collection
        assert_eq!(order.maker_relayer_fee, U256::from(750));
        assert_eq!(order.taker_relayer_fee, U256::zero());
        assert_eq!(order.exchange, cfg.exchange_address);
    }

    #[test]
    fn salts_are_unique() {
        let cfg = ExchangeConfig::default();
        let params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(1));
        let a = build_sell_order(&params, &cfg, NOW).unwrap();
        let b = build_sell_order(&params, &cfg, NOW).unwrap();

        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn sell_calldata_leaves_buyer_replaceable() {
        let asset = sample_asset().reference();
        let call = encode_sell(&asset, U256::one(), seller_address());

        assert_eq!(call.calldata.len(), 4 + 3 * 32);
        assert_eq!(&call.calldata[0..4], &id(ERC721_TRANSFER));
        assert_eq!(&call.calldata[16..36], seller_address().as_bytes());
        assert!(call.calldata[36..68].iter().all(|b| *b == 0));
        assert!(call.replacement_pattern[36..68].iter().all(|b| *b == 0xff));
        assert!(call.replacement_pattern[..36].iter().all(|b| *b == 0));
        assert!(call.replacement_pattern[68..].iter().all(|b| *b == 0));
    }

    #[test]
    fn erc1155_calldata_carries_quantity() {
        let mut asset = sample_asset().reference();
        asset.standard = TokenStandard::Erc1155;
        let call = encode_buy(&asset, U256::from(3), seller_address());

        // five head words plus the empty bytes length word
        assert_eq!(call.calldata.len(), 4 + 6 * 32);
        assert_eq!(&call.calldata[0..4], &id(ERC1155_TRANSFER));
        assert_eq!(U256::from_big_endian(&call.calldata[100..132]), U256::from(3));
        assert!(call.replacement_pattern[4..36].iter().all(|b| *b == 0xff));
        assert_eq!(call.replacement_pattern.len(), call.calldata.len());
    }

    #[test]
    fn rejects_negative_price() {
        let cfg = ExchangeConfig::default();
        let params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(-1));

        assert!(matches!(
            build_sell_order(&params, &cfg, NOW),
            Err(OrderError::InvalidOrderField { field: "basePrice", .. })
        ));
    }

    #[test]
    fn rejects_sub_wei_precision() {
        assert!(to_base_units(dec!(0.0000000000000000001), 18, "basePrice").is_err());
        assert_eq!(
            to_base_units(dec!(1.5), 6, "basePrice").unwrap(),
            U256::from(1_500_000)
        );
        assert_eq!(to_base_units(dec!(0), 18, "basePrice").unwrap(), U256::zero());
    }

    #[test]
    fn dutch_auction_needs_expiration() {
        let cfg = ExchangeConfig::default();
        let mut params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(2));
        params.end_amount = Some(dec!(1));

        assert!(build_sell_order(&params, &cfg, NOW).is_err());

        params.expiration_time = NOW + 3_600;
        let order = build_sell_order(&params, &cfg, NOW).unwrap();
        assert_eq!(order.sale_kind, SaleKind::DutchAuction);
        assert_eq!(order.extra, U256::exp10(18));
    }

    #[test]
    fn dutch_auction_cannot_end_below_zero() {
        let cfg = ExchangeConfig::default();
        let mut params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(1));
        params.end_amount = Some(dec!(-1));
        params.expiration_time = NOW + 3_600;

        assert!(matches!(
            build_sell_order(&params, &cfg, NOW),
            Err(OrderError::InvalidOrderField { field: "extra", .. })
        ));

        params.start_amount = Decimal::MAX;
        params.end_amount = Some(Decimal::ZERO);
        assert!(build_sell_order(&params, &cfg, NOW).is_err());
    }

    #[test]
    fn oversized_inputs_are_refused_not_panicking() {
        let fees = sample_asset().fees;
        assert!(matches!(
            compute_fees(&fees, Side::Sell, u32::MAX),
            Err(OrderError::InvalidOrderField { field: "makerReferrerFee", .. })
        ));

        let huge = CollectionFees {
            opensea_seller_fee_basis_points: u32::MAX,
            dev_seller_fee_basis_points: u32::MAX,
            opensea_buyer_fee_basis_points: u32::MAX,
            dev_buyer_fee_basis_points: 1,
        };
        assert!(compute_fees(&huge, Side::Buy, 0).is_err());

        assert!(matches!(
            time_parameters(u64::MAX, None, true, NOW),
            Err(OrderError::InvalidOrderField { field: "expirationTime", .. })
        ));
    }

    #[test]
    fn english_auction_shape() {
        let cfg = ExchangeConfig::default();
        let mut params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(1));
        params.wait_for_highest_bid = true;
        params.expiration_time = NOW + 86_400;

        // ether is not allowed
        assert!(build_sell_order(&params, &cfg, NOW).is_err());

        params.payment_token = PaymentToken::Erc20(cfg.weth_address);
        params.english_auction_reserve_price = Some(dec!(2));
        let order = build_sell_order(&params, &cfg, NOW).unwrap();

        assert_eq!(order.listing_time, U256::from(NOW + 86_400));
        assert_eq!(
            order.expiration_time,
            U256::from(NOW + 86_400 + ORDER_MATCHING_LATENCY_SECONDS)
        );
        assert!(order.fee_recipient.is_zero());
        assert_eq!(order.maker_relayer_fee, U256::zero());
        assert_eq!(order.taker_relayer_fee, U256::from(750));
        assert_eq!(
            order.metadata.english_auction_reserve_price,
            Some(U256::exp10(18) * U256::from(2))
        );
    }

    #[test]
    fn time_parameter_rules() {
        assert!(time_parameters(NOW + 5, None, false, NOW).is_err());
        assert!(time_parameters(0, Some(NOW - 1), false, NOW).is_err());
        assert!(time_parameters(NOW + 100, Some(NOW + 100), false, NOW).is_err());
        assert!(time_parameters(0, None, true, NOW).is_err());
        assert_eq!(
            time_parameters(0, Some(NOW + 50), false, NOW).unwrap(),
            (U256::from(NOW + 50), U256::zero())
        );
    }

    #[test]
    fn bounty_is_capped_by_collection_fee() {
        let fees = sample_asset().fees;

        assert!(compute_fees(&fees, Side::Sell, 100).is_ok());
        assert!(compute_fees(&fees, Side::Sell, 200).is_err());
        assert_eq!(
            compute_fees(&fees, Side::Buy, 200)
                .unwrap()
                .seller_bounty_basis_points,
            0
        );
    }

    #[test]
    fn matching_order_mirrors_listing() {
        let cfg = ExchangeConfig::default();
        let params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(0.5));
        let sell = build_sell_order(&params, &cfg, NOW).unwrap();
        let buyer = Address::repeat_byte(0x0b);

        let buy = build_matching_order(&sell, buyer, buyer, None, &cfg, NOW).unwrap();

        assert_eq!(buy.side, Side::Buy);
        assert_eq!(buy.maker, buyer);
        assert_eq!(buy.taker, sell.maker);
        assert_eq!(buy.base_price, sell.base_price);
        assert_eq!(buy.payment_token, sell.payment_token);
        assert_eq!(buy.target, sell.target);
        assert!(buy.fee_recipient.is_zero());
        assert_eq!(buy.sale_kind, SaleKind::FixedPrice);
        assert_eq!(buy.expiration_time, U256::zero());
        assert_eq!(buy.calldata.len(), sell.calldata.len());
        assert_eq!(&buy.calldata[48..68], buyer.as_bytes());
        assert_ne!(buy.salt, sell.salt);
    }

    #[test]
    fn offers_must_not_undercut_listing() {
        let cfg = ExchangeConfig::default();
        let params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(1));
        let sell = build_sell_order(&params, &cfg, NOW).unwrap();
        let buyer = Address::repeat_byte(0x0b);

        assert!(build_matching_order(&sell, buyer, buyer, Some(U256::one()), &cfg, NOW).is_err());
        let bid = build_matching_order(&sell, buyer, buyer, Some(U256::exp10(18) * U256::from(2)), &cfg, NOW)
            .unwrap();
        assert_eq!(bid.base_price, U256::exp10(18) * U256::from(2));
    }
}
