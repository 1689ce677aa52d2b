use crate::error::MathError;
use alloy_primitives::U256;

const U256_ONE: U256 = U256::ONE;
const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

/// Computes `a * b / denominator` with a full 512‑bit intermediate
/// product, returning a `MathError` on overflow or division by zero.
///
/// This mirrors the Solidity `FullMath.mulDiv` behavior and underpins
/// every price × price and price × liquidity computation in the crate.
#[inline]
pub fn mul_div(a: U256, b: U256, mut denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    // 512-bit product as prod1 * 2^256 + prod0
    let mm = a.mul_mod(b, U256::MAX);
    let mut prod0 = a.wrapping_mul(b);

    let (mut prod1, borrow1) = mm.overflowing_sub(prod0);
    if borrow1 {
        prod1 = prod1.wrapping_sub(U256_ONE);
    }

    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }

    if denominator <= prod1 {
        return Err(MathError::Overflow);
    }

    let remainder = a.mul_mod(b, denominator);
    let (prod0_new, borrow2) = prod0.overflowing_sub(remainder);
    prod0 = prod0_new;
    if borrow2 {
        prod1 = prod1.wrapping_sub(U256_ONE);
    }

    let twos = denominator & denominator.wrapping_neg();
    denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    let twos_adj = twos
        .wrapping_neg()
        .wrapping_div(twos)
        .wrapping_add(U256_ONE);
    prod0 |= prod1.wrapping_mul(twos_adj);

    // inverse of denominator mod 2^256, correct to 4 bits, then 6 Newton steps
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;

    macro_rules! newton_iteration {
        () => {
            inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)))
        };
    }

    newton_iteration!();
    newton_iteration!();
    newton_iteration!();
    newton_iteration!();
    newton_iteration!();
    newton_iteration!();

    Ok(prod0.wrapping_mul(inv))
}

/// Like [`mul_div`], but rounds the result up when there is a
/// non‑zero remainder, returning an overflow error if the result
/// would exceed `U256::MAX`.
#[inline]
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;

    if a.mul_mod(b, denominator) > U256::ZERO {
        if result == U256::MAX {
            return Err(MathError::Overflow);
        }
        return Ok(result + U256::ONE);
    }
    Ok(result)
}

/// Divides `a` by `b`, rounding the result up to the next integer
/// when there is a non‑zero remainder.
///
/// This will panic on division by zero, mirroring primitive integer
/// division, so callers must ensure `b != 0`.
#[inline]
pub fn div_rounding_up(a: U256, b: U256) -> U256 {
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U512;
    use proptest::prelude::*;

    // ------------------------- mul_div tests -------------------------

    #[test]
    fn mul_div_simple_division() {
        let a = U256::from(10u8);
        let b = U256::from(20u8);
        let denominator = U256::from(5u8);

        let result = mul_div(a, b, denominator).unwrap();
        assert_eq!(result, U256::from(40u8));
    }

    #[test]
    fn mul_div_division_by_zero() {
        let result = mul_div(U256::from(10u8), U256::from(20u8), U256::ZERO);
        assert!(matches!(result, Err(MathError::DivisionByZero)));
    }

    #[test]
    fn mul_div_division_by_zero_with_small_product() {
        // product fits in 256 bits, the zero check must still fire
        let result = mul_div(U256::ONE, U256::ONE, U256::ZERO);
        assert!(matches!(result, Err(MathError::DivisionByZero)));
    }

    #[test]
    fn mul_div_product_above_256_bits() {
        // 2^200 * 2^200 / 2^150 = 2^250
        let a = U256::ONE << 200;
        let b = U256::ONE << 200;
        let denominator = U256::ONE << 150;

        let result = mul_div(a, b, denominator).unwrap();
        assert_eq!(result, U256::ONE << 250);
    }

    #[test]
    fn mul_div_large_multiplication_no_overflow() {
        // (2^256 - 1) * (2^256 - 1) / (2^256 - 1) = 2^256 - 1
        let result = mul_div(U256::MAX, U256::MAX, U256::MAX).unwrap();
        assert_eq!(result, U256::MAX);
    }

    #[test]
    fn mul_div_phantom_overflow() {
        // Q128 * 35Q128 / 8Q128, product overflows but the quotient does not
        let q128 = U256::ONE << 128;
        let result = mul_div(
            q128,
            U256::from(35u8) * q128,
            U256::from(8u8) * q128,
        )
        .unwrap();
        assert_eq!(result, U256::from(4375u32) * q128 / U256::from(1000u32));
    }

    #[test]
    fn mul_div_result_overflow() {
        // (2^256 - 1) * 2 / 1 cannot fit in 256 bits
        let result = mul_div(U256::MAX, U256::from(2u8), U256::ONE);
        assert!(matches!(result, Err(MathError::Overflow)));
    }

    #[test]
    fn mul_div_rounding_down_behavior() {
        // 7 * 10 / 8 = 8.75, floor is 8
        let result = mul_div(U256::from(7u8), U256::from(10u8), U256::from(8u8)).unwrap();
        assert_eq!(result, U256::from(8u32));
    }

    // ------------------------- mul_div_rounding_up tests -------------------------

    #[test]
    fn mul_div_rounding_up_exact_division() {
        let result = mul_div_rounding_up(U256::from(20u8), U256::from(10u8), U256::from(5u8)).unwrap();
        assert_eq!(result, U256::from(40u8));
    }

    #[test]
    fn mul_div_rounding_up_non_exact() {
        // 70 / 3 = 23.33.., ceil is 24
        let result = mul_div_rounding_up(U256::from(7u8), U256::from(10u8), U256::from(3u8)).unwrap();
        assert_eq!(result, U256::from(24u8));
    }

    #[test]
    fn mul_div_rounding_up_overflows_just_above_max() {
        // (2^256-1)^2 / (2^256-2) = 2^256 + 1/(2^256-2)
        let result = mul_div_rounding_up(U256::MAX, U256::MAX, U256::MAX - U256::ONE);
        assert!(matches!(result, Err(MathError::Overflow)));
    }

    #[test]
    fn mul_div_rounding_up_propagates_overflow_from_mul_div() {
        let result = mul_div_rounding_up(U256::MAX, U256::from(2u8), U256::ONE);
        assert!(matches!(result, Err(MathError::Overflow)));
    }

    // ------------------------- div_rounding_up tests -------------------------

    #[test]
    fn div_rounding_up_exact_division() {
        assert_eq!(div_rounding_up(U256::from(10u8), U256::from(5u8)), U256::from(2u8));
    }

    #[test]
    fn div_rounding_up_non_exact() {
        assert_eq!(div_rounding_up(U256::from(10u8), U256::from(3u8)), U256::from(4u8));
    }

    #[test]
    fn div_rounding_up_large_non_exact() {
        assert_eq!(div_rounding_up(U256::MAX, U256::MAX - U256::ONE), U256::from(2u8));
    }

    #[test]
    #[should_panic]
    fn div_rounding_up_division_by_zero_panics() {
        let _ = div_rounding_up(U256::from(10u8), U256::ZERO);
    }

    // ------------------------- property tests -------------------------

    fn u256() -> impl Strategy<Value = U256> {
        any::<[u64; 4]>().prop_map(U256::from_limbs)
    }

    proptest! {
        #[test]
        fn mul_div_matches_512_bit_reference(a in u256(), b in u256(), d in u256()) {
            prop_assume!(!d.is_zero());

            let expected = U512::from(a) * U512::from(b) / U512::from(d);
            match mul_div(a, b, d) {
                Ok(result) => prop_assert_eq!(U512::from(result), expected),
                Err(err) => {
                    prop_assert_eq!(err, MathError::Overflow);
                    prop_assert!(expected > U512::from(U256::MAX));
                }
            }
        }

        #[test]
        fn mul_div_rounding_up_is_ceiling(a in u256(), b in any::<u128>(), d in 1u128..) {
            let b = U256::from(b);
            let d = U256::from(d);
            let product = U512::from(a) * U512::from(b);
            let (quotient, remainder) = product.div_rem(U512::from(d));
            let expected = if remainder.is_zero() { quotient } else { quotient + U512::from(1u8) };

            match mul_div_rounding_up(a, b, d) {
                Ok(result) => prop_assert_eq!(U512::from(result), expected),
                Err(_) => prop_assert!(expected > U512::from(U256::MAX)),
            }
        }
    }
}
