//! Conversions between the header's 256-bit difficulty and the signed
//! arbitrary-precision integers the retargeting math runs on.

use num_bigint::{BigInt, Sign};
use ubiq_chain_types::U256;

/// Widen a difficulty into a signed big integer.
pub(crate) fn big_from_u256(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Narrow a computed difficulty back into the header representation.
///
/// Negative values collapse to zero and anything wider than 256 bits
/// saturates; the retargeting algorithms never produce either in practice
/// because the actual timespan is clamped to a positive window.
pub(crate) fn u256_from_big(value: &BigInt) -> U256 {
    let (sign, bytes) = value.to_bytes_be();
    if sign == Sign::Minus {
        return U256::ZERO;
    }
    if bytes.len() > 32 {
        return U256::MAX;
    }
    U256::from_be_slice(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bigint() {
        for value in [
            U256::ZERO,
            U256::from(1u64),
            U256::from(131_072u64),
            U256::MAX,
        ] {
            assert_eq!(u256_from_big(&big_from_u256(value)), value);
        }
    }

    #[test]
    fn negative_collapses_to_zero() {
        assert_eq!(u256_from_big(&BigInt::from(-5)), U256::ZERO);
    }

    #[test]
    fn oversized_saturates() {
        let wide = BigInt::from(1) << 300;
        assert_eq!(u256_from_big(&wide), U256::MAX);
    }
}
