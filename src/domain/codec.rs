//! Relay Wire Codec - ABI Tuple Encoding of Orders
//!
//! The spoke encodes an order into a fixed ABI tuple
//! `(uint256 marketId, uint256 price, uint256 amount, bool isBuy)`
//! before dispatching it through the mailbox; the hub decodes the
//! same layout on delivery. Decode rejects wrong-length or malformed
//! payloads atomically — no partial order ever reaches the book.

use alloy::primitives::U256;
use alloy::sol;
use alloy::sol_types::SolValue;

use crate::error::DecodeError;

sol! {
    /// Wire layout of a relayed order. Field order is part of the
    /// protocol; changing it breaks cross-domain compatibility.
    struct OrderPayload {
        uint256 marketId;
        uint256 price;
        uint256 amount;
        bool isBuy;
    }
}

/// Four statically-sized fields, 32 bytes each.
pub const ENCODED_LEN: usize = 128;

/// A decoded relay message. The user identity is NOT on the wire; it
/// is propagated out-of-band by the relay context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayMessage {
    pub market_id: U256,
    pub price: U256,
    pub amount: U256,
    pub is_buy: bool,
}

impl RelayMessage {
    /// Encode into the fixed ABI tuple layout.
    pub fn encode(&self) -> Vec<u8> {
        OrderPayload {
            marketId: self.market_id,
            price: self.price,
            amount: self.amount,
            isBuy: self.is_buy,
        }
        .abi_encode()
    }

    /// Decode a payload, rejecting anything that is not an exact,
    /// well-formed encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != ENCODED_LEN {
            return Err(DecodeError::BadLength {
                got: bytes.len(),
                expected: ENCODED_LEN,
            });
        }

        let payload = OrderPayload::abi_decode(bytes, true).map_err(DecodeError::Abi)?;

        Ok(Self {
            market_id: payload.marketId,
            price: payload.price,
            amount: payload.amount,
            is_buy: payload.isBuy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RelayMessage {
        RelayMessage {
            market_id: U256::from(42u64),
            price: U256::from(55u64),
            amount: U256::from(1_000u64),
            is_buy: true,
        }
    }

    #[test]
    fn test_round_trip() {
        let msg = sample();
        let decoded = RelayMessage::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_encoded_length_is_fixed() {
        assert_eq!(sample().encode().len(), ENCODED_LEN);
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let mut bytes = sample().encode();
        bytes.truncate(64);
        let err = RelayMessage::decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::BadLength { got: 64, .. }));
    }

    #[test]
    fn test_decode_rejects_trailing_garbage() {
        let mut bytes = sample().encode();
        bytes.extend_from_slice(&[0u8; 32]);
        assert!(RelayMessage::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_bool() {
        let mut bytes = sample().encode();
        // isBuy occupies the last word; 2 is not a valid bool encoding
        bytes[ENCODED_LEN - 1] = 2;
        let err = RelayMessage::decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Abi(_)));
    }

    #[test]
    fn test_max_values_round_trip() {
        let msg = RelayMessage {
            market_id: U256::MAX,
            price: U256::MAX,
            amount: U256::MAX,
            is_buy: false,
        };
        assert_eq!(RelayMessage::decode(&msg.encode()).unwrap(), msg);
    }
}
