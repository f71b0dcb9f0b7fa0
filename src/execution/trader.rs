use ethers::types::{H256, U256};
use log::{info, warn};
use std::sync::Arc;

use crate::config::{ExchangeConfig, ListingConfig};
use crate::domain::time::now_ts;
use crate::domain::{
    AuctionKind, MatchedPair, OrderIntent, OrderLifecycle, OrderStage, PaymentToken, SignedOrder,
    Side,
};
use crate::execution::errors::OrderError;
use crate::execution::exchange::ExchangeContract;
use crate::execution::factory::{
    assign_orders_to_sides, build_matching_order, build_sell_order, SellOrderParams,
};
use crate::execution::hashing::hash_order;
use crate::execution::validation::{
    ensure_proxy, validate_buy_order, validate_order_against_contract, validate_sell_order,
};
use crate::logging::{log_rejection, log_signed_order, log_stage, log_success};
use crate::wallet::allowance::ApprovalState;
use crate::wallet::signer::{authorize_order, verify_order, SigningCapability};

// ==================================================
// OUTCOMES
// ==================================================

/// A validated, signed listing ready for the order book.
#[derive(Debug, Clone)]
pub struct Listing {
    pub order: SignedOrder,
    pub lifecycle: OrderLifecycle,
}

impl Listing {
    /// The order book accepted the listing.
    pub fn published(&self) -> Result<Listing, OrderError> {
        Ok(Listing {
            order: self.order.clone(),
            lifecycle: self.lifecycle.advance(OrderStage::Submitted)?,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Fulfillment {
    /// Settled on-chain through `atomicMatch_`.
    Matched {
        tx_hash: H256,
        price: U256,
        buy: SignedOrder,
        sell: SignedOrder,
        lifecycle: OrderLifecycle,
    },
    /// English auction bid, to be published to the order book.
    BidPrepared {
        bid: SignedOrder,
        lifecycle: OrderLifecycle,
    },
}

impl Fulfillment {
    pub fn lifecycle(&self) -> &OrderLifecycle {
        match self {
            Fulfillment::Matched { lifecycle, .. } | Fulfillment::BidPrepared { lifecycle, .. } => {
                lifecycle
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cancellation {
    pub tx_hash: H256,
    pub lifecycle: OrderLifecycle,
}

/// Moves a failed flow to `Rejected`. The error is what callers get back;
/// it stands in for the rejected lifecycle.
pub fn rejection(lifecycle: &OrderLifecycle, err: OrderError) -> (OrderLifecycle, OrderError) {
    match lifecycle.advance(OrderStage::Rejected) {
        Ok(rejected) => (rejected, err),
        Err(_) => (lifecycle.clone(), err),
    }
}

// ==================================================
// TRADER
// ==================================================

pub struct Trader<E, A> {
    exchange: Arc<E>,
    approvals: Arc<A>,
    config: ExchangeConfig,
    settings: ListingConfig,
}

impl<E, A> Trader<E, A>
where
    E: ExchangeContract,
    A: ApprovalState,
{
    pub fn new(
        exchange: Arc<E>,
        approvals: Arc<A>,
        config: ExchangeConfig,
        settings: ListingConfig,
    ) -> Self {
        Self {
            exchange,
            approvals,
            config,
            settings,
        }
    }

    fn reject(
        &self,
        lifecycle: &OrderLifecycle,
        hash: Option<H256>,
        err: OrderError,
    ) -> OrderError {
        let (rejected, err) = rejection(lifecycle, err);
        if let Some(hash) = hash {
            log_stage(hash, rejected.stage());
        }
        log_rejection(&err.to_string());
        err
    }

    fn payment_decimals(&self, token: PaymentToken) -> u32 {
        match token {
            PaymentToken::Native => 18,
            PaymentToken::Erc20(_) => self.settings.payment_token_decimals,
        }
    }

    // ==================================================
    // SELL
    // ==================================================

    /// Builds a sell order after making sure the seller's proxy exists.
    pub async fn prepare_sell_order(
        &self,
        params: &SellOrderParams,
    ) -> Result<OrderIntent, OrderError> {
        let order = build_sell_order(params, &self.config, now_ts())?;
        ensure_proxy(order.maker, self.approvals.as_ref(), &self.settings).await?;
        Ok(order)
    }

    /// List an asset: build, hash, sign and validate the sell order. The
    /// result is the payload for the order book; publishing it is up to the
    /// caller.
    pub async fn fulfill_nft_sell_order<S>(
        &self,
        params: SellOrderParams,
        signer: &S,
    ) -> Result<Listing, OrderError>
    where
        S: SigningCapability + ?Sized,
    {
        if params.seller != signer.address() {
            return Err(self.reject(
                &OrderLifecycle::built(),
                None,
                OrderError::invalid("maker", "seller is not the connected signer"),
            ));
        }

        info!("🏷️  Listing {}", params.asset.label());

        let intent = self.prepare_sell_order(&params).await?;
        let lifecycle = OrderLifecycle::built();

        let hashed = hash_order(intent)?;
        let lifecycle = lifecycle.advance(OrderStage::Hashed)?;
        log_stage(hashed.hash, OrderStage::Hashed);

        let hash = hashed.hash;
        let signed = authorize_order(hashed, signer)
            .await
            .map_err(|e| self.reject(&lifecycle, Some(hash), e))?;
        let lifecycle = lifecycle.advance(OrderStage::Signed)?;
        log_stage(hash, OrderStage::Signed);

        validate_sell_order(
            &signed.intent,
            signer,
            self.approvals.as_ref(),
            self.exchange.as_ref(),
            &self.settings,
        )
        .await
        .map_err(|e| self.reject(&lifecycle, Some(hash), e))?;
        verify_order(&signed).map_err(|e| self.reject(&lifecycle, Some(hash), e))?;
        let lifecycle = lifecycle.advance(OrderStage::Validated)?;
        log_stage(hash, OrderStage::Validated);

        log_signed_order(&signed, self.payment_decimals(signed.payment_token));
        Ok(Listing {
            order: signed,
            lifecycle,
        })
    }

    // ==================================================
    // BUY / BID / ACCEPT
    // ==================================================

    /// Take the other side of `order`. Fixed-price orders settle on-chain,
    /// English auctions produce a signed bid, Dutch auctions are refused.
    pub async fn fulfill_nft_order<S>(
        &self,
        order: SignedOrder,
        signer: &S,
        offer: Option<U256>,
    ) -> Result<Fulfillment, OrderError>
    where
        S: SigningCapability + ?Sized,
    {
        let kind = order.auction_kind();
        if kind == AuctionKind::DutchAuction {
            return Err(self.reject(
                &OrderLifecycle::signed(),
                Some(order.hash),
                OrderError::UnsupportedSaleKind("Dutch auctions are not supported".into()),
            ));
        }

        verify_order(&order)
            .map_err(|e| self.reject(&OrderLifecycle::signed(), Some(order.hash), e))?;

        let account = signer.address();
        let matching =
            build_matching_order(&order, account, account, offer, &self.config, now_ts())?;
        let lifecycle = OrderLifecycle::built();

        let hashed = hash_order(matching)?;
        let lifecycle = lifecycle.advance(OrderStage::Hashed)?;
        let hash = hashed.hash;
        log_stage(hash, OrderStage::Hashed);

        let signed = authorize_order(hashed, signer)
            .await
            .map_err(|e| self.reject(&lifecycle, Some(hash), e))?;
        let lifecycle = lifecycle.advance(OrderStage::Signed)?;
        log_stage(hash, OrderStage::Signed);

        if kind == AuctionKind::EnglishAuction {
            info!("🔨 English auction: preparing bid {:#x}", hash);
            validate_buy_order(
                &signed.intent,
                signer,
                self.approvals.as_ref(),
                self.exchange.as_ref(),
                &self.config,
                &self.settings,
            )
            .await
            .map_err(|e| self.reject(&lifecycle, Some(hash), e))?;
            let lifecycle = lifecycle.advance(OrderStage::Validated)?;

            log_signed_order(&signed, self.payment_decimals(signed.payment_token));
            return Ok(Fulfillment::BidPrepared {
                bid: signed,
                lifecycle,
            });
        }

        let (buy, sell) = assign_orders_to_sides(order, signed);
        self.settle(buy, sell, signer, lifecycle).await
    }

    async fn settle<S>(
        &self,
        buy: SignedOrder,
        sell: SignedOrder,
        signer: &S,
        lifecycle: OrderLifecycle,
    ) -> Result<Fulfillment, OrderError>
    where
        S: SigningCapability + ?Sized,
    {
        let ours = if buy.maker == signer.address() {
            Side::Buy
        } else {
            Side::Sell
        };
        let hash = match ours {
            Side::Buy => buy.hash,
            Side::Sell => sell.hash,
        };

        let own_side = match ours {
            Side::Buy => {
                validate_buy_order(
                    &buy.intent,
                    signer,
                    self.approvals.as_ref(),
                    self.exchange.as_ref(),
                    &self.config,
                    &self.settings,
                )
                .await
            }
            Side::Sell => {
                validate_sell_order(
                    &sell.intent,
                    signer,
                    self.approvals.as_ref(),
                    self.exchange.as_ref(),
                    &self.settings,
                )
                .await
            }
        };
        own_side.map_err(|e| self.reject(&lifecycle, Some(hash), e))?;

        if !validate_order_against_contract(&sell, self.exchange.as_ref()).await? {
            return Err(self.reject(
                &lifecycle,
                Some(hash),
                OrderError::ValidationFailed("sell order is invalid".into()),
            ));
        }
        if !validate_order_against_contract(&buy, self.exchange.as_ref()).await? {
            return Err(self.reject(
                &lifecycle,
                Some(hash),
                OrderError::ValidationFailed("buy order is invalid".into()),
            ));
        }

        let pair = MatchedPair::new(buy, sell, now_ts())
            .map_err(|e| self.reject(&lifecycle, Some(hash), e))?;
        let lifecycle = lifecycle.advance(OrderStage::Validated)?;
        log_stage(hash, OrderStage::Validated);

        let price = self.exchange.calculate_match_price(&pair).await?;
        let value = if pair.sell().payment_token.is_native() {
            price
        } else {
            U256::zero()
        };
        info!("💱 Match price: {} (value {})", price, value);

        let tx_hash = self.exchange.atomic_match(&pair, value).await.map_err(|e| {
            warn!("❌ atomicMatch_ failed for {:#x}", hash);
            e
        })?;
        let lifecycle = lifecycle.advance(OrderStage::Submitted)?;
        log_stage(hash, OrderStage::Submitted);
        log_success(&format!("Matched {:#x} in tx {:#x}", hash, tx_hash));

        Ok(Fulfillment::Matched {
            tx_hash,
            price,
            buy: pair.buy().clone(),
            sell: pair.sell().clone(),
            lifecycle,
        })
    }

    // ==================================================
    // CANCEL
    // ==================================================

    pub async fn cancel_nft_listing<S>(
        &self,
        sell_order: SignedOrder,
        signer: &S,
    ) -> Result<Cancellation, OrderError>
    where
        S: SigningCapability + ?Sized,
    {
        if sell_order.maker != signer.address() {
            return Err(self.reject(
                &OrderLifecycle::signed(),
                Some(sell_order.hash),
                OrderError::ValidationFailed("only the maker can cancel an order".into()),
            ));
        }

        info!("🗑️  Cancelling order {:#x}", sell_order.hash);
        let lifecycle = OrderLifecycle::signed();
        let tx_hash = self.exchange.cancel_order(&sell_order).await?;
        let lifecycle = lifecycle.advance(OrderStage::Cancelled)?;
        log_stage(sell_order.hash, OrderStage::Cancelled);
        log_success(&format!("Cancelled {:#x} in tx {:#x}", sell_order.hash, tx_hash));

        Ok(Cancellation { tx_hash, lifecycle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SaleKind;
    use crate::execution::exchange::MockExchangeContract;
    use crate::execution::test_support::{buyer, sample_asset, sample_sell_intent, seller};
    use crate::wallet::allowance::MockApprovalState;
    use ethers::types::Address;
    use rust_decimal_macros::dec;

    async fn signed_listing(intent: OrderIntent) -> SignedOrder {
        authorize_order(hash_order(intent).unwrap(), &seller())
            .await
            .unwrap()
    }

    fn funded_buyer() -> MockApprovalState {
        let mut approvals = MockApprovalState::new();
        approvals
            .expect_payment_balance()
            .returning(|_, _| Ok(U256::MAX));
        approvals
            .expect_token_allowance()
            .returning(|_, _, _| Ok(U256::MAX));
        approvals
    }

    fn exchange_for(order: &OrderIntent) -> MockExchangeContract {
        let mut exchange = MockExchangeContract::new();
        exchange.expect_address().return_const(order.exchange);
        exchange
            .expect_validate_order_parameters()
            .returning(|_| Ok(true));
        exchange
            .expect_cancelled_or_finalized()
            .returning(|_| Ok(false));
        exchange
    }

    fn trader(
        exchange: MockExchangeContract,
        approvals: MockApprovalState,
    ) -> Trader<MockExchangeContract, MockApprovalState> {
        Trader::new(
            Arc::new(exchange),
            Arc::new(approvals),
            ExchangeConfig::default(),
            ListingConfig::default(),
        )
    }

    #[tokio::test]
    async fn dutch_auction_is_rejected_without_contract_calls() {
        let mut intent = sample_sell_intent();
        intent.sale_kind = SaleKind::DutchAuction;
        let order = signed_listing(intent).await;

        let trader = trader(MockExchangeContract::new(), MockApprovalState::new());
        let err = trader
            .fulfill_nft_order(order, &buyer(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::UnsupportedSaleKind(_)));
    }

    #[test]
    fn failed_flows_end_rejected() {
        let (lifecycle, err) = rejection(
            &OrderLifecycle::signed(),
            OrderError::UnsupportedSaleKind("Dutch auctions are not supported".into()),
        );
        assert_eq!(lifecycle.stage(), OrderStage::Rejected);
        assert_eq!(lifecycle.history().len(), 4);
        assert!(matches!(err, OrderError::UnsupportedSaleKind(_)));

        let cancelled = OrderLifecycle::signed()
            .advance(OrderStage::Cancelled)
            .unwrap();
        let (unchanged, _) = rejection(&cancelled, OrderError::OrderBook("late".into()));
        assert_eq!(unchanged.stage(), OrderStage::Cancelled);
    }

    #[tokio::test]
    async fn fixed_price_purchase_matches_atomically() {
        let sell_intent = sample_sell_intent();
        let listing = signed_listing(sell_intent.clone()).await;
        let base_price = listing.base_price;

        let mut exchange = exchange_for(&sell_intent);
        exchange.expect_validate_order().times(2).returning(|_| Ok(true));
        exchange
            .expect_calculate_match_price()
            .times(1)
            .returning(move |_| Ok(base_price));
        exchange
            .expect_atomic_match()
            .withf(move |pair, value| {
                *value == base_price
                    && pair.buy().side == Side::Buy
                    && pair.sell().salt == sell_intent.salt
            })
            .times(1)
            .returning(|_, _| Ok(H256::repeat_byte(0xaa)));

        let trader = trader(exchange, funded_buyer());
        let outcome = trader
            .fulfill_nft_order(listing, &buyer(), None)
            .await
            .unwrap();

        match outcome {
            Fulfillment::Matched {
                tx_hash,
                price,
                buy,
                lifecycle,
                ..
            } => {
                assert_eq!(tx_hash, H256::repeat_byte(0xaa));
                assert_eq!(price, base_price);
                assert_eq!(buy.maker, buyer().address());
                verify_order(&buy).unwrap();
                assert_eq!(lifecycle.stage(), OrderStage::Submitted);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_sell_order_never_reaches_atomic_match() {
        let sell_intent = sample_sell_intent();
        let listing = signed_listing(sell_intent.clone()).await;
        let listing_hash = listing.hash;

        let mut exchange = exchange_for(&sell_intent);
        exchange
            .expect_validate_order()
            .returning(move |order| Ok(order.hash != listing_hash));
        exchange.expect_calculate_match_price().never();
        exchange.expect_atomic_match().never();

        let trader = trader(exchange, funded_buyer());
        let err = trader
            .fulfill_nft_order(listing, &buyer(), None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("sell order is invalid"));
    }

    #[tokio::test]
    async fn invalid_buy_order_never_reaches_atomic_match() {
        let sell_intent = sample_sell_intent();
        let listing = signed_listing(sell_intent.clone()).await;
        let listing_hash = listing.hash;

        let mut exchange = exchange_for(&sell_intent);
        exchange
            .expect_validate_order()
            .returning(move |order| Ok(order.hash == listing_hash));
        exchange.expect_atomic_match().never();

        let trader = trader(exchange, funded_buyer());
        let err = trader
            .fulfill_nft_order(listing, &buyer(), None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("buy order is invalid"));
    }

    #[tokio::test]
    async fn english_auction_yields_a_bid_without_matching() {
        let cfg = ExchangeConfig::default();
        let mut sell_intent = sample_sell_intent();
        sell_intent.payment_token = PaymentToken::Erc20(cfg.weth_address);
        sell_intent.metadata.waiting_for_best_counter_order = true;
        sell_intent.fee_recipient = Address::zero();
        let listing = signed_listing(sell_intent.clone()).await;

        let mut exchange = exchange_for(&sell_intent);
        exchange.expect_validate_order().never();
        exchange.expect_atomic_match().never();

        let trader = trader(exchange, funded_buyer());
        let bid_amount = sell_intent.base_price * U256::from(2);
        let outcome = trader
            .fulfill_nft_order(listing, &buyer(), Some(bid_amount))
            .await
            .unwrap();

        match outcome {
            Fulfillment::BidPrepared { bid, lifecycle } => {
                assert_eq!(bid.side, Side::Buy);
                assert_eq!(bid.base_price, bid_amount);
                assert_eq!(bid.fee_recipient, cfg.fee_recipient);
                verify_order(&bid).unwrap();
                assert_eq!(lifecycle.stage(), OrderStage::Validated);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_invokes_contract_once() {
        let listing = signed_listing(sample_sell_intent()).await;
        let expected = listing.clone();

        let mut exchange = MockExchangeContract::new();
        exchange
            .expect_cancel_order()
            .withf(move |order| *order == expected)
            .times(1)
            .returning(|_| Ok(H256::repeat_byte(0xcc)));

        let trader = trader(exchange, MockApprovalState::new());
        let cancelled = trader.cancel_nft_listing(listing, &seller()).await.unwrap();

        assert_eq!(cancelled.tx_hash, H256::repeat_byte(0xcc));
        assert_eq!(cancelled.lifecycle.stage(), OrderStage::Cancelled);
    }

    #[tokio::test]
    async fn only_maker_may_cancel() {
        let listing = signed_listing(sample_sell_intent()).await;

        let mut exchange = MockExchangeContract::new();
        exchange.expect_cancel_order().never();

        let trader = trader(exchange, MockApprovalState::new());
        assert!(matches!(
            trader.cancel_nft_listing(listing, &buyer()).await,
            Err(OrderError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn listing_flow_produces_verifiable_order() {
        let sell_intent = sample_sell_intent();
        let params = SellOrderParams::fixed_price(sample_asset(), seller().address(), dec!(0.1));

        let mut approvals = MockApprovalState::new();
        approvals
            .expect_proxy_for()
            .returning(|_| Ok(Some(Address::repeat_byte(0x77))));
        approvals
            .expect_asset_balance()
            .returning(|_, _| Ok(U256::one()));
        approvals
            .expect_is_approved_for_all()
            .returning(|_, _, _| Ok(true));

        let trader = trader(exchange_for(&sell_intent), approvals);
        let listing = trader
            .fulfill_nft_sell_order(params, &seller())
            .await
            .unwrap();

        assert_eq!(listing.order.expiration_time, U256::zero());
        assert!(listing.order.payment_token.is_native());
        assert_eq!(listing.order.metadata.quantity, U256::one());
        verify_order(&listing.order).unwrap();
        assert_eq!(listing.lifecycle.stage(), OrderStage::Validated);
        assert_eq!(
            listing.published().unwrap().lifecycle.stage(),
            OrderStage::Submitted
        );
    }
}
