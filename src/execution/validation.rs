//! Pre-submission checks. A failure here ends the attempt; the caller has
//! to fix the precondition and validate again.

use ethers::types::{Address, U256};
use log::{info, warn};

use crate::config::{ExchangeConfig, ListingConfig};
use crate::domain::{AuctionKind, OrderIntent, PaymentToken, SaleKind, SignedOrder, Side};
use crate::execution::errors::OrderError;
use crate::execution::exchange::ExchangeContract;
use crate::execution::factory::INVERSE_BASIS_POINT;
use crate::wallet::allowance::ApprovalState;
use crate::wallet::signer::SigningCapability;

fn failed(reason: impl Into<String>) -> OrderError {
    OrderError::ValidationFailed(reason.into())
}

/// Structural checks that need no chain access.
pub fn check_order_fields(order: &OrderIntent, exchange: Address) -> Result<(), OrderError> {
    if order.exchange != exchange {
        return Err(OrderError::invalid(
            "exchange",
            format!("order targets {:?}, expected {:?}", order.exchange, exchange),
        ));
    }
    if order.maker.is_zero() {
        return Err(OrderError::invalid("maker", "maker address is empty"));
    }
    if order.target.is_zero() {
        return Err(OrderError::invalid("target", "target address is empty"));
    }
    let max_fee = U256::from(INVERSE_BASIS_POINT);
    if order.maker_relayer_fee > max_fee || order.taker_relayer_fee > max_fee {
        return Err(OrderError::invalid("makerRelayerFee", "relayer fees exceed 100%"));
    }
    if order.replacement_pattern.len() != order.calldata.len()
        && !order.replacement_pattern.is_empty()
    {
        return Err(OrderError::invalid(
            "replacementPattern",
            "length differs from calldata",
        ));
    }
    if order.sale_kind == SaleKind::DutchAuction && order.expiration_time.is_zero() {
        return Err(OrderError::invalid(
            "expirationTime",
            "Dutch auctions need an expiration time",
        ));
    }
    Ok(())
}

async fn ensure_parameters_accepted<E>(order: &OrderIntent, exchange: &E) -> Result<(), OrderError>
where
    E: ExchangeContract + ?Sized,
{
    if !exchange.validate_order_parameters(order).await? {
        return Err(failed("exchange rejected the order parameters"));
    }
    Ok(())
}

/// Makes sure the maker has a Wyvern proxy, registering one when allowed.
pub async fn ensure_proxy<A>(
    owner: Address,
    approvals: &A,
    settings: &ListingConfig,
) -> Result<Address, OrderError>
where
    A: ApprovalState + ?Sized,
{
    if let Some(proxy) = approvals.proxy_for(owner).await? {
        return Ok(proxy);
    }
    if !settings.auto_approve {
        return Err(failed("no Wyvern proxy registered for the seller"));
    }

    warn!("⚠️  No proxy for {:?}, registering one...", owner);
    approvals.register_proxy().await?;

    approvals
        .proxy_for(owner)
        .await?
        .ok_or_else(|| failed("proxy registration did not produce a proxy"))
}

/// Seller side: ownership, proxy, asset approval and contract parameters.
pub async fn validate_sell_order<S, A, E>(
    order: &OrderIntent,
    signer: &S,
    approvals: &A,
    exchange: &E,
    settings: &ListingConfig,
) -> Result<(), OrderError>
where
    S: SigningCapability + ?Sized,
    A: ApprovalState + ?Sized,
    E: ExchangeContract + ?Sized,
{
    check_order_fields(order, exchange.address())?;

    if order.side != Side::Sell {
        return Err(OrderError::invalid("side", "expected a sell order"));
    }
    if signer.address() != order.maker {
        return Err(failed("signer is not the seller"));
    }
    if order.auction_kind() == AuctionKind::EnglishAuction && order.payment_token.is_native() {
        return Err(failed("English auctions must be paid in an ERC-20 token"));
    }

    let asset = &order.metadata.asset;
    let held = approvals.asset_balance(order.maker, asset).await?;
    if held < order.metadata.quantity {
        return Err(failed(format!(
            "seller holds {} of the asset, order needs {}",
            held, order.metadata.quantity
        )));
    }

    let proxy = ensure_proxy(order.maker, approvals, settings).await?;

    if !approvals
        .is_approved_for_all(asset, order.maker, proxy)
        .await?
    {
        if !settings.auto_approve {
            return Err(failed("asset is not approved for the seller's proxy"));
        }
        warn!("⚠️  Approving asset contract for proxy {:?}...", proxy);
        approvals.approve_all(asset, proxy).await?;
    } else {
        info!("✅ Asset approval OK");
    }

    ensure_parameters_accepted(order, exchange).await
}

/// Buyer side: funds, payment token allowance and contract parameters.
pub async fn validate_buy_order<S, A, E>(
    order: &OrderIntent,
    signer: &S,
    approvals: &A,
    exchange: &E,
    config: &ExchangeConfig,
    settings: &ListingConfig,
) -> Result<(), OrderError>
where
    S: SigningCapability + ?Sized,
    A: ApprovalState + ?Sized,
    E: ExchangeContract + ?Sized,
{
    check_order_fields(order, exchange.address())?;

    if order.side != Side::Buy {
        return Err(OrderError::invalid("side", "expected a buy order"));
    }
    if signer.address() != order.maker {
        return Err(failed("signer is not the buyer"));
    }

    let required = order.base_price;
    let balance = approvals
        .payment_balance(order.payment_token, order.maker)
        .await?;
    if balance < required {
        return Err(failed(format!(
            "insufficient balance: need {}, have {}",
            required, balance
        )));
    }

    if let PaymentToken::Erc20(token) = order.payment_token {
        let spender = config.token_transfer_proxy_address;
        let allowance = approvals
            .token_allowance(token, order.maker, spender)
            .await?;

        if allowance < required {
            if !settings.auto_approve {
                return Err(failed("payment token allowance is too low"));
            }
            warn!("⚠️  Approving payment token for transfer proxy...");
            approvals.approve_token(token, spender).await?;
        } else {
            info!("✅ Payment token allowance OK");
        }
    }

    ensure_parameters_accepted(order, exchange).await
}

/// Both the contract's own `validateOrder_` and the cancelled/finalized map.
pub async fn validate_order_against_contract<E>(
    order: &SignedOrder,
    exchange: &E,
) -> Result<bool, OrderError>
where
    E: ExchangeContract + ?Sized,
{
    if exchange.cancelled_or_finalized(order.hash).await? {
        warn!("❌ Order {:#x} is cancelled or already filled", order.hash);
        return Ok(false);
    }
    exchange.validate_order(order).await
}
