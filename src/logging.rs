use ethers::types::{H256, U256};
use log::{debug, error, info};

use crate::domain::time::{now_ts, time_remaining};
use crate::domain::{OrderStage, SignedOrder};
use crate::wallet::balance::to_display_amount;

pub fn log_rejection(reason: &str) {
    error!("❌ Rejected: {}", reason);
}

pub fn log_stage(hash: H256, stage: OrderStage) {
    debug!("🔁 {:#x} → {:?}", hash, stage);
}

/// `amount` in whole payment-token units, raw base units when it does not fit.
pub fn format_price(amount: U256, decimals: u32) -> String {
    match to_display_amount(amount, decimals) {
        Some(price) => price.normalize().to_string(),
        None => format!("{} (base units)", amount),
    }
}

pub fn format_expiry(expiration: U256, now: u64) -> String {
    if expiration > U256::from(u64::MAX) {
        return "INVALID".to_string();
    }
    time_remaining(expiration.as_u64(), now)
}

/// `decimals` are those of the order's payment token.
pub fn log_signed_order(order: &SignedOrder, decimals: u32) {
    info!("🧾 Signed {} order {:#x}", order.side.as_str(), order.hash);
    info!("   Maker: {:?}", order.maker);
    info!("   Asset: {:?} #{}", order.target, order.metadata.asset.token_id);
    info!(
        "   Base price: {} (extra {})",
        format_price(order.base_price, decimals),
        format_price(order.extra, decimals)
    );
    info!("   Expires: {}", format_expiry(order.expiration_time, now_ts()));
    if order.calldata.len() >= 4 {
        debug!("   Selector: 0x{}", hex::encode(&order.calldata[..4]));
    }
}

pub fn log_success(msg: &str) {
    info!("✅ {}", msg);
}
