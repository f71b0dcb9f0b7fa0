//! Canonical order encoding.
//!
//! The exchange re-derives the order hash on every `validateOrder_`,
//! `cancelOrder_` and `atomicMatch_` and recovers the signer from it, so
//! the layout here has to be byte-identical to the contract's `hashOrder`:
//! addresses are 20 bytes, uints 32 bytes big-endian, enums a single byte
//! and byte arrays are written raw, all packed back to back.

use ethers::types::{Address, H256, U256};
use ethers::utils::{hash_message, keccak256};

use crate::domain::{HashedOrder, OrderIntent};
use crate::execution::errors::OrderError;

const ADDRESS_LEN: usize = 20;
const UINT_LEN: usize = 32;

fn packed_len(order: &OrderIntent) -> usize {
    ADDRESS_LEN * 7
        + UINT_LEN * 9
        + 4
        + order.calldata.len()
        + order.replacement_pattern.len()
        + order.static_extradata.len()
}

fn write_address(buf: &mut Vec<u8>, address: Address) {
    buf.extend_from_slice(address.as_bytes());
}

fn write_uint(buf: &mut Vec<u8>, value: U256) {
    let mut word = [0u8; UINT_LEN];
    value.to_big_endian(&mut word);
    buf.extend_from_slice(&word);
}

pub fn encode_order(order: &OrderIntent) -> Result<Vec<u8>, OrderError> {
    if !order.replacement_pattern.is_empty()
        && order.replacement_pattern.len() != order.calldata.len()
    {
        return Err(OrderError::invalid(
            "replacementPattern",
            format!(
                "length {} does not match calldata length {}",
                order.replacement_pattern.len(),
                order.calldata.len()
            ),
        ));
    }

    let mut buf = Vec::with_capacity(packed_len(order));

    write_address(&mut buf, order.exchange);
    write_address(&mut buf, order.maker);
    write_address(&mut buf, order.taker);
    write_uint(&mut buf, order.maker_relayer_fee);
    write_uint(&mut buf, order.taker_relayer_fee);
    write_uint(&mut buf, order.maker_protocol_fee);
    write_uint(&mut buf, order.taker_protocol_fee);
    write_address(&mut buf, order.fee_recipient);
    buf.push(order.fee_method.as_u8());
    buf.push(order.side.as_u8());
    buf.push(order.sale_kind.as_u8());
    write_address(&mut buf, order.target);
    buf.push(order.how_to_call.as_u8());
    buf.extend_from_slice(&order.calldata);
    buf.extend_from_slice(&order.replacement_pattern);
    write_address(&mut buf, order.static_target);
    buf.extend_from_slice(&order.static_extradata);
    write_address(&mut buf, order.payment_token.address());
    write_uint(&mut buf, order.base_price);
    write_uint(&mut buf, order.extra);
    write_uint(&mut buf, order.listing_time);
    write_uint(&mut buf, order.expiration_time);
    write_uint(&mut buf, order.salt);

    debug_assert_eq!(buf.len(), packed_len(order));
    Ok(buf)
}

pub fn order_hash(order: &OrderIntent) -> Result<H256, OrderError> {
    Ok(H256::from(keccak256(encode_order(order)?)))
}

pub fn hash_order(order: OrderIntent) -> Result<HashedOrder, OrderError> {
    let hash = order_hash(&order)?;
    Ok(HashedOrder {
        intent: order,
        hash,
    })
}

/// The digest the maker actually signs: the order hash behind the
/// `"\x19Ethereum Signed Message:\n32"` prefix.
pub fn hash_to_sign(hash: H256) -> H256 {
    hash_message(hash.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeeMethod, HowToCall, PaymentToken, SaleKind, Side};
    use crate::execution::test_support::sample_sell_intent;
    use ethers::types::Bytes;

    #[test]
    fn hashing_is_deterministic() {
        let order = sample_sell_intent();

        assert_eq!(order_hash(&order).unwrap(), order_hash(&order).unwrap());
        assert_eq!(
            hash_order(order.clone()).unwrap().hash,
            hash_order(order).unwrap().hash
        );
    }

    #[test]
    fn packed_layout_matches_contract() {
        let order = sample_sell_intent();
        let bytes = encode_order(&order).unwrap();

        // 7 addresses, 9 uints, 4 enum bytes and the three byte arrays
        assert_eq!(bytes.len(), 7 * 20 + 9 * 32 + 4 + 2 * order.calldata.len());
        assert_eq!(&bytes[0..20], order.exchange.as_bytes());
        assert_eq!(&bytes[20..40], order.maker.as_bytes());
        assert_eq!(&bytes[40..60], order.taker.as_bytes());

        // fee recipient follows the four fee words
        let fee_recipient_at = 60 + 4 * 32;
        assert_eq!(
            &bytes[fee_recipient_at..fee_recipient_at + 20],
            order.fee_recipient.as_bytes()
        );
        let enums_at = fee_recipient_at + 20;
        assert_eq!(
            &bytes[enums_at..enums_at + 3],
            &[FeeMethod::SplitFee as u8, Side::Sell as u8, SaleKind::FixedPrice as u8]
        );

        // salt is the last word
        let mut salt = [0u8; 32];
        order.salt.to_big_endian(&mut salt);
        assert_eq!(&bytes[bytes.len() - 32..], &salt);
    }

    type Mutation = Box<dyn Fn(&mut OrderIntent)>;

    fn mutation(f: impl Fn(&mut OrderIntent) + 'static) -> Mutation {
        Box::new(f)
    }

    #[test]
    fn every_hashed_field_changes_the_hash() {
        let base = sample_sell_intent();
        let baseline = order_hash(&base).unwrap();
        let other = Address::repeat_byte(0x42);

        let mutations: Vec<(&str, Mutation)> = vec![
            ("exchange", mutation(move |o| o.exchange = other)),
            ("maker", mutation(move |o| o.maker = other)),
            ("taker", mutation(move |o| o.taker = other)),
            ("makerRelayerFee", mutation(|o| o.maker_relayer_fee += U256::one())),
            ("takerRelayerFee", mutation(|o| o.taker_relayer_fee += U256::one())),
            ("makerProtocolFee", mutation(|o| o.maker_protocol_fee += U256::one())),
            ("takerProtocolFee", mutation(|o| o.taker_protocol_fee += U256::one())),
            ("feeRecipient", mutation(move |o| o.fee_recipient = other)),
            ("feeMethod", mutation(|o| o.fee_method = FeeMethod::ProtocolFee)),
            ("side", mutation(|o| o.side = Side::Buy)),
            ("saleKind", mutation(|o| o.sale_kind = SaleKind::DutchAuction)),
            ("target", mutation(move |o| o.target = other)),
            ("howToCall", mutation(|o| o.how_to_call = HowToCall::DelegateCall)),
            ("calldata", mutation(|o| {
                let mut data = o.calldata.to_vec();
                data[4] ^= 0x01;
                o.calldata = Bytes::from(data);
            })),
            ("replacementPattern", mutation(|o| {
                let mut data = o.replacement_pattern.to_vec();
                data[4] ^= 0xff;
                o.replacement_pattern = Bytes::from(data);
            })),
            ("staticTarget", mutation(move |o| o.static_target = other)),
            ("staticExtradata", mutation(|o| o.static_extradata = Bytes::from(vec![0x01]))),
            ("paymentToken", mutation(move |o| o.payment_token = PaymentToken::Erc20(other))),
            ("basePrice", mutation(|o| o.base_price += U256::one())),
            ("extra", mutation(|o| o.extra += U256::one())),
            ("listingTime", mutation(|o| o.listing_time += U256::one())),
            ("expirationTime", mutation(|o| o.expiration_time += U256::one())),
            ("salt", mutation(|o| o.salt += U256::one())),
        ];

        for (field, mutate) in mutations {
            let mut changed = base.clone();
            mutate(&mut changed);
            assert_ne!(
                order_hash(&changed).unwrap(),
                baseline,
                "changing {} kept the hash",
                field
            );
        }
    }

    #[test]
    fn off_chain_metadata_is_not_hashed() {
        let base = sample_sell_intent();
        let mut changed = base.clone();
        changed.metadata.maker_referrer_fee = U256::from(50);

        assert_eq!(order_hash(&base).unwrap(), order_hash(&changed).unwrap());
    }

    #[test]
    fn rejects_mismatched_replacement_pattern() {
        let mut order = sample_sell_intent();
        order.replacement_pattern = Bytes::from(vec![0xff; 3]);

        assert!(matches!(
            encode_order(&order),
            Err(OrderError::InvalidOrderField {
                field: "replacementPattern",
                ..
            })
        ));
    }

    #[test]
    fn signing_digest_uses_eip191_prefix() {
        let hash = H256::repeat_byte(0xab);
        let mut prefixed = b"\x19Ethereum Signed Message:\n32".to_vec();
        prefixed.extend_from_slice(hash.as_bytes());

        assert_eq!(hash_to_sign(hash), H256::from(keccak256(prefixed)));
    }
}
