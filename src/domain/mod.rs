use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

pub mod lifecycle;
pub mod order;
pub mod time;

pub use lifecycle::{OrderLifecycle, OrderStage};
pub use order::*;

// ==================================================
// ASSETS
// ==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStandard {
    #[serde(alias = "erc721")]
    Erc721,
    #[serde(alias = "erc1155")]
    Erc1155,
}

/// Fee schedule of the collection an asset belongs to, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionFees {
    pub opensea_seller_fee_basis_points: u32,
    pub opensea_buyer_fee_basis_points: u32,
    pub dev_seller_fee_basis_points: u32,
    pub dev_buyer_fee_basis_points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub token_address: Address,
    pub token_id: U256,
    pub standard: TokenStandard,
    pub name: Option<String>,
    pub fees: CollectionFees,
}

impl Asset {
    pub fn reference(&self) -> AssetRef {
        AssetRef {
            token_address: self.token_address,
            token_id: self.token_id,
            standard: self.standard,
        }
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} (#{})", name, self.token_id),
            None => format!("{:?} #{}", self.token_address, self.token_id),
        }
    }
}
