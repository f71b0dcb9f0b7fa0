use wyvern_order_client::*;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Args, Command, Config};
use ethers::prelude::*;
use log::{info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use client::order_json::OrderJson;
use client::{OrderBookClient, OrderQuery};
use domain::{AuctionKind, PaymentToken};
use execution::factory::{to_base_units, SellOrderParams};
use execution::hashing::order_hash;
use execution::{Fulfillment, OrderError, Trader, WyvernExchange};
use wallet::{ChainApprovals, SigningCapability, WalletSigner};

type ChainClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Flags failures that are worth retrying by hand.
fn explain(e: OrderError) -> anyhow::Error {
    if e.is_transient() {
        warn!("🔁 {} (transient, safe to retry)", e);
    }
    e.into()
}

fn parse_token_id(raw: &str) -> Result<U256> {
    U256::from_dec_str(raw).with_context(|| format!("invalid token id {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    // ===============================
    // OFFLINE: HASH AN ORDER FILE
    // ===============================
    if let Command::Hash { order } = &args.command {
        let content = std::fs::read_to_string(order)
            .with_context(|| format!("reading {}", order.display()))?;
        let json: OrderJson = serde_json::from_str(&content).context("parsing order JSON")?;
        let hash = order_hash(&json.to_intent()?)?;

        println!("{:#x}", hash);
        if hash != json.hash {
            warn!("⚠️  File reports hash {:#x}", json.hash);
        }
        return Ok(());
    }

    info!("🚀 Starting Wyvern order client");

    // ===============================
    // PROVIDER + SIGNER
    // ===============================
    let rpc_url = std::env::var("RPC_URL").context("RPC_URL missing in .env")?;
    let provider = Provider::<Http>::try_from(rpc_url.as_str()).context("invalid RPC_URL")?;

    let private_key = std::env::var("PRIVATE_KEY")
        .ok()
        .or_else(|| config.wallet.private_key.clone())
        .context("PRIVATE_KEY missing in .env file")?;
    let signer = WalletSigner::new(&private_key, config.wallet.chain_id)?;
    let account = signer.address();

    info!("🔑 Signer loaded: {:?}", account);

    let client: Arc<ChainClient> = Arc::new(SignerMiddleware::new(provider, signer.wallet().clone()));

    // ===============================
    // COLLABORATORS
    // ===============================
    let exchange = Arc::new(WyvernExchange::new(
        config.exchange.exchange_address,
        client.clone(),
    )?);
    let approvals = Arc::new(ChainApprovals::new(
        client.clone(),
        config.exchange.proxy_registry_address,
    ));
    let trader = Trader::new(
        exchange,
        approvals,
        config.exchange.clone(),
        config.listing.clone(),
    );

    let read_only = Config::is_read_only();
    if read_only {
        warn!("📝 READ ONLY: orders are logged, not posted");
    }
    let api = OrderBookClient::new(&config.exchange.api_url, config.api_key(), read_only)?;

    match args.command {
        // ===============================
        // SELL
        // ===============================
        Command::Sell {
            contract,
            token_id,
            price,
            end_price,
            expiration,
            english,
            reserve_price,
            bounty_bps,
        } => {
            let asset = api
                .get_asset(contract, parse_token_id(&token_id)?, &config.listing)
                .await
                .context("fetching asset")?;

            let mut params = SellOrderParams::fixed_price(asset, account, price);
            params.end_amount = end_price;
            params.expiration_time = expiration;
            params.extra_bounty_basis_points = bounty_bps;
            params.english_auction_reserve_price = reserve_price;
            if english {
                params.wait_for_highest_bid = true;
                params.payment_token = PaymentToken::Erc20(config.exchange.weth_address);
                params.payment_decimals = config.listing.payment_token_decimals;
            }

            let listing = trader
                .fulfill_nft_sell_order(params, &signer)
                .await
                .map_err(explain)?;
            if api.post_order(&listing.order).await?.is_some() {
                let listing = listing.published()?;
                info!(
                    "✅ Listing {:#x} is {:?}",
                    listing.order.hash,
                    listing.lifecycle.stage()
                );
            }
        }

        // ===============================
        // BUY / BID
        // ===============================
        Command::Buy {
            contract,
            token_id,
            bid,
        } => {
            let query = OrderQuery::listings(contract, parse_token_id(&token_id)?);
            let order = api
                .get_orders(&query)
                .await?
                .into_iter()
                .next()
                .context("no open listing for this asset")?;

            let decimals = if order.payment_token.is_native() {
                18
            } else {
                config.listing.payment_token_decimals
            };
            let offer = bid
                .map(|amount: Decimal| to_base_units(amount, decimals, "basePrice"))
                .transpose()?;
            if offer.is_some() && order.auction_kind() != AuctionKind::EnglishAuction {
                warn!("⚠️  Bid amount ignored: listing is not an English auction");
            }
            let offer = offer.filter(|_| order.auction_kind() == AuctionKind::EnglishAuction);

            match trader
                .fulfill_nft_order(order, &signer, offer)
                .await
                .map_err(explain)?
            {
                Fulfillment::Matched { tx_hash, price, .. } => {
                    info!("✅ Bought for {} in tx {:#x}", price, tx_hash);
                }
                Fulfillment::BidPrepared { bid, .. } => {
                    api.post_order(&bid).await?;
                    info!("✅ Bid {:#x} placed", bid.hash);
                }
            }
        }

        // ===============================
        // CANCEL
        // ===============================
        Command::Cancel { contract, token_id } => {
            let query = OrderQuery::listings(contract, parse_token_id(&token_id)?).by_maker(account);
            let order = api
                .get_orders(&query)
                .await?
                .into_iter()
                .next()
                .context("no listing of ours for this asset")?;

            let cancelled = trader
                .cancel_nft_listing(order, &signer)
                .await
                .map_err(explain)?;
            info!(
                "✅ Cancelled in tx {:#x} ({:?})",
                cancelled.tx_hash,
                cancelled.lifecycle.stage()
            );
        }

        // answered offline above
        Command::Hash { .. } => {}
    }

    Ok(())
}
