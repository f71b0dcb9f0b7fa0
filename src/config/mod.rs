use clap::{Parser, Subcommand};
use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/* =======================
MAINNET DEPLOYMENTS
======================= */

pub const WYVERN_EXCHANGE: &str = "0x7be8076f4ea4a4ad08075c2508e481d6c946d12b";
pub const WYVERN_PROXY_REGISTRY: &str = "0xa5409ec958c83c3f309868babaca7c86dcb077c1";
pub const WYVERN_TOKEN_TRANSFER_PROXY: &str = "0xe5c783ee536cf5e63e792988335c4255169be4e1";
pub const OPENSEA_FEE_RECIPIENT: &str = "0x5b3256965e7c3cf26e11fcaf296dfc8807c01073";
pub const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

fn static_address(literal: &str) -> Address {
    literal.parse().expect("static address literal")
}

/* =======================
CLI ARGS
======================= */

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List an asset for sale and publish the signed order
    Sell {
        /// Asset contract address
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        token_id: String,
        /// Start price in the payment token (e.g. 0.1)
        #[arg(long)]
        price: Decimal,
        /// End price, turns the listing into a Dutch auction
        #[arg(long)]
        end_price: Option<Decimal>,
        /// Unix timestamp, 0 = never expires
        #[arg(long, default_value_t = 0)]
        expiration: u64,
        /// Wait for the highest bid (English auction, paid in WETH)
        #[arg(long, default_value_t = false)]
        english: bool,
        #[arg(long)]
        reserve_price: Option<Decimal>,
        #[arg(long, default_value_t = 0)]
        bounty_bps: u32,
    },
    /// Buy an asset from its cheapest listing, or bid on an English auction
    Buy {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        token_id: String,
        /// Bid amount for English auctions
        #[arg(long)]
        bid: Option<Decimal>,
    },
    /// Cancel our own listing for an asset
    Cancel {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        token_id: String,
    },
    /// Print the hash of an order stored as JSON
    Hash {
        #[arg(long)]
        order: PathBuf,
    },
}

/* =======================
MAIN CONFIG
======================= */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub listing: ListingConfig,
    pub wallet: WalletConfig,
}

/* =======================
EXCHANGE CONFIG
======================= */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub api_url: String,
    pub api_key: Option<String>,

    pub exchange_address: Address,
    pub proxy_registry_address: Address,
    pub token_transfer_proxy_address: Address,
    pub fee_recipient: Address,
    pub weth_address: Address,
}

/* =======================
LISTING DEFAULTS
======================= */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Fee schedule used when the API does not report one
    pub default_seller_fee_basis_points: u32,
    pub default_buyer_fee_basis_points: u32,

    /// Decimals of ERC-20 payment tokens (WETH)
    pub payment_token_decimals: u32,

    /// Send approval transactions automatically during validation.
    /// When false a missing approval fails validation instead.
    pub auto_approve: bool,
}

/* =======================
WALLET CONFIG
======================= */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub private_key: Option<String>,
    pub chain_id: u64,
}

/* =======================
DEFAULT CONFIG
======================= */

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.opensea.io".to_string(),
            api_key: None,
            exchange_address: static_address(WYVERN_EXCHANGE),
            proxy_registry_address: static_address(WYVERN_PROXY_REGISTRY),
            token_transfer_proxy_address: static_address(WYVERN_TOKEN_TRANSFER_PROXY),
            fee_recipient: static_address(OPENSEA_FEE_RECIPIENT),
            weth_address: static_address(WETH),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_seller_fee_basis_points: 250,
            default_buyer_fee_basis_points: 0,
            payment_token_decimals: 18,
            auto_approve: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exchange: ExchangeConfig::default(),
            listing: ListingConfig::default(),
            wallet: WalletConfig {
                private_key: None,
                chain_id: 1,
            },
        }
    }
}

/* =======================
LOAD / CREATE CONFIG
======================= */

impl Config {
    pub fn load(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            let cfg = Config::default();
            let content = serde_json::to_string_pretty(&cfg)?;
            std::fs::write(path, content)?;
            Ok(cfg)
        }
    }
}

// ==================================================
// ENVIRONMENT HELPERS
// ==================================================

impl Config {
    /// Check if running in read-only mode
    pub fn is_read_only() -> bool {
        std::env::var("READ_ONLY")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false)
    }

    /// API key from the environment wins over the config file
    pub fn api_key(&self) -> Option<String> {
        std::env::var("OPENSEA_API_KEY")
            .ok()
            .or_else(|| self.exchange.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_survives_json() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(back.exchange.exchange_address, static_address(WYVERN_EXCHANGE));
        assert_eq!(back.listing.default_seller_fee_basis_points, 250);
        assert!(back.listing.auto_approve);
    }

    #[test]
    fn load_creates_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "wyvern-order-client-{}.json",
            ::rand::random::<u64>()
        ));

        let cfg = Config::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.wallet.chain_id, 1);

        let again = Config::load(&path).unwrap();
        assert_eq!(again.exchange.api_url, cfg.exchange.api_url);

        std::fs::remove_file(path).ok();
    }
}
