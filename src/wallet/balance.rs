use ethers::prelude::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::PaymentToken;
use crate::execution::errors::OrderError;

abigen!(
    Erc20Contract,
    r#"[
        function balanceOf(address) view returns (uint256)
        function allowance(address,address) view returns (uint256)
        function approve(address,uint256) returns (bool)
        function decimals() view returns (uint8)
    ]"#
);

/// Balance of the payment token in base units.
pub async fn payment_balance<M: Middleware + 'static>(
    client: Arc<M>,
    token: PaymentToken,
    owner: Address,
) -> Result<U256, OrderError> {
    match token {
        PaymentToken::Native => client
            .get_balance(owner, None)
            .await
            .map_err(|e| OrderError::contract("eth_getBalance", e)),
        PaymentToken::Erc20(address) => Erc20Contract::new(address, client)
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| OrderError::contract("balanceOf", e)),
    }
}

/// Base units as a display amount, e.g. wei to ether.
pub fn to_display_amount(raw: U256, decimals: u32) -> Option<Decimal> {
    if raw > U256::from(u128::MAX) {
        return None;
    }
    let divisor = Decimal::from_u128(10u128.checked_pow(decimals)?)?;
    Decimal::from_u128(raw.as_u128())?.checked_div(divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_wei_for_display() {
        let wei = U256::from(100_000_000_000_000_000u64);
        assert_eq!(to_display_amount(wei, 18), Some(dec!(0.1)));
        assert_eq!(to_display_amount(U256::from(1_500_000), 6), Some(dec!(1.5)));
        assert_eq!(to_display_amount(U256::MAX, 18), None);
    }
}
