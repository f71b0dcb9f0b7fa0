//! Fixtures shared by the unit tests.

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use rust_decimal_macros::dec;

use crate::config::ExchangeConfig;
use crate::domain::{Asset, CollectionFees, OrderIntent, TokenStandard};
use crate::execution::factory::{build_sell_order, SellOrderParams};
use crate::wallet::signer::WalletSigner;

pub const NOW: u64 = 1_650_000_000;

pub const SELLER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const BUYER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub fn seller() -> WalletSigner {
    WalletSigner::new(SELLER_KEY, 1).unwrap()
}

pub fn buyer() -> WalletSigner {
    WalletSigner::new(BUYER_KEY, 1).unwrap()
}

pub fn seller_address() -> Address {
    SELLER_KEY.parse::<LocalWallet>().unwrap().address()
}

pub fn sample_asset() -> Asset {
    Asset {
        token_address: "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"
            .parse()
            .unwrap(),
        token_id: U256::from(1234),
        standard: TokenStandard::Erc721,
        name: Some("Sample Ape".to_string()),
        fees: CollectionFees {
            opensea_seller_fee_basis_points: 250,
            opensea_buyer_fee_basis_points: 0,
            dev_seller_fee_basis_points: 500,
            dev_buyer_fee_basis_points: 0,
        },
    }
}

pub fn sample_sell_intent() -> OrderIntent {
    let params = SellOrderParams::fixed_price(sample_asset(), seller_address(), dec!(0.1));
    build_sell_order(&params, &ExchangeConfig::default(), NOW).unwrap()
}
