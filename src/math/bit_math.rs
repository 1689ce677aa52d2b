use crate::error::MathError;
use alloy_primitives::U256;

/// Returns the index (0–255) of the most significant set bit of `x`,
/// or `MathError::ZeroValue` when `x` is zero.
///
/// `get_tick_at_sqrt_ratio` uses it as the integer part of `log2`.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok((x.bit_len() - 1) as u8)
}

/// Returns the index (0–255) of the least significant set bit of `x`,
/// or `MathError::ZeroValue` when `x` is zero.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_errors_on_zero() {
        assert!(matches!(most_significant_bit(U256::ZERO), Err(MathError::ZeroValue)));
    }

    #[test]
    fn msb_of_one() {
        assert_eq!(most_significant_bit(U256::ONE).unwrap(), 0);
    }

    #[test]
    fn msb_of_every_power_of_two() {
        for bit in 0..256usize {
            assert_eq!(most_significant_bit(U256::ONE << bit).unwrap() as usize, bit);
        }
    }

    #[test]
    fn msb_ignores_lower_bits() {
        // 2^160 - 1 has its top bit at 159
        let x = (U256::ONE << 160) - U256::ONE;
        assert_eq!(most_significant_bit(x).unwrap(), 159);
    }

    #[test]
    fn msb_of_max_u256() {
        assert_eq!(most_significant_bit(U256::MAX).unwrap(), 255);
    }

    #[test]
    fn lsb_errors_on_zero() {
        assert!(matches!(least_significant_bit(U256::ZERO), Err(MathError::ZeroValue)));
    }

    #[test]
    fn lsb_of_every_power_of_two() {
        for bit in 0..256usize {
            assert_eq!(least_significant_bit(U256::ONE << bit).unwrap() as usize, bit);
        }
    }

    #[test]
    fn lsb_ignores_higher_bits() {
        assert_eq!(least_significant_bit(U256::MAX).unwrap(), 0);
        assert_eq!(least_significant_bit(U256::from(0b1011000u8)).unwrap(), 3);
    }
}
