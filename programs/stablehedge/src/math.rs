//! Checked fixed-point arithmetic helpers
//!
//! All ledger math in this program goes through these functions so that
//! overflow, underflow and lossy casts surface as `MathOverflow` instead of
//! wrapping or truncating silently.

use {
    crate::error::StablehedgeError,
    anchor_lang::prelude::*,
    num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, NumCast, One, Zero},
    std::fmt::Display,
};

pub fn checked_add<T>(arg1: T, arg2: T) -> Result<T>
where
    T: CheckedAdd + Display,
{
    if let Some(res) = arg1.checked_add(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} + {}", arg1, arg2);
        err!(StablehedgeError::MathOverflow)
    }
}

pub fn checked_sub<T>(arg1: T, arg2: T) -> Result<T>
where
    T: CheckedSub + Display,
{
    if let Some(res) = arg1.checked_sub(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} - {}", arg1, arg2);
        err!(StablehedgeError::MathOverflow)
    }
}

pub fn checked_mul<T>(arg1: T, arg2: T) -> Result<T>
where
    T: CheckedMul + Display,
{
    if let Some(res) = arg1.checked_mul(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} * {}", arg1, arg2);
        err!(StablehedgeError::MathOverflow)
    }
}

pub fn checked_div<T>(arg1: T, arg2: T) -> Result<T>
where
    T: CheckedDiv + Display,
{
    if let Some(res) = arg1.checked_div(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} / {}", arg1, arg2);
        err!(StablehedgeError::MathOverflow)
    }
}

/// Division rounding the quotient up. Used for fee amounts, which always
/// round against the caller.
pub fn checked_ceil_div<T>(arg1: T, arg2: T) -> Result<T>
where
    T: CheckedAdd + CheckedSub + CheckedDiv + CheckedMul + Zero + One + PartialEq + Copy + Display,
{
    if arg1.is_zero() {
        return Ok(T::zero());
    }
    if let Some(res) = arg1.checked_div(&arg2) {
        let product = checked_mul(res, arg2)?;
        if product == arg1 {
            Ok(res)
        } else {
            checked_add(res, T::one())
        }
    } else {
        msg!("Error: Overflow in {} / {}", arg1, arg2);
        err!(StablehedgeError::MathOverflow)
    }
}

pub fn checked_pow<T>(arg: T, exp: usize) -> Result<T>
where
    T: CheckedMul + One + Copy + Display,
{
    let mut res = T::one();
    for _ in 0..exp {
        res = checked_mul(res, arg)?;
    }
    Ok(res)
}

pub fn checked_as_u64<T>(arg: T) -> Result<u64>
where
    T: Display + NumCast + Clone,
{
    let option: Option<u64> = NumCast::from(arg.clone());
    if let Some(res) = option {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} as u64", arg);
        err!(StablehedgeError::MathOverflow)
    }
}

pub fn checked_as_u128<T>(arg: T) -> Result<u128>
where
    T: Display + NumCast + Clone,
{
    let option: Option<u128> = NumCast::from(arg.clone());
    if let Some(res) = option {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} as u128", arg);
        err!(StablehedgeError::MathOverflow)
    }
}

/// Guarded signed cast. Any token amount that flows into the signed
/// `stocks_users` accumulator must pass through here first.
pub fn checked_as_i64<T>(arg: T) -> Result<i64>
where
    T: Display + NumCast + Clone,
{
    let option: Option<i64> = NumCast::from(arg.clone());
    if let Some(res) = option {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} as i64", arg);
        err!(StablehedgeError::MathOverflow)
    }
}

/// Multiply two decimal values given as (mantissa, exponent) pairs and
/// return the mantissa of the product scaled to `target_exponent`.
pub fn checked_decimal_mul(
    coefficient1: u64,
    exponent1: i32,
    coefficient2: u64,
    exponent2: i32,
    target_exponent: i32,
) -> Result<u64> {
    if coefficient1 == 0 || coefficient2 == 0 {
        return Ok(0);
    }
    let target_power = checked_sub(checked_add(exponent1, exponent2)?, target_exponent)?;
    if target_power >= 0 {
        checked_as_u64(checked_mul(
            checked_mul(coefficient1 as u128, coefficient2 as u128)?,
            checked_pow(10u128, target_power as usize)?,
        )?)
    } else {
        checked_as_u64(checked_div(
            checked_mul(coefficient1 as u128, coefficient2 as u128)?,
            checked_pow(10u128, (-target_power) as usize)?,
        )?)
    }
}

/// Same as `checked_decimal_mul` but rounds the result up.
pub fn checked_decimal_ceil_mul(
    coefficient1: u64,
    exponent1: i32,
    coefficient2: u64,
    exponent2: i32,
    target_exponent: i32,
) -> Result<u64> {
    if coefficient1 == 0 || coefficient2 == 0 {
        return Ok(0);
    }
    let target_power = checked_sub(checked_add(exponent1, exponent2)?, target_exponent)?;
    if target_power >= 0 {
        checked_as_u64(checked_mul(
            checked_mul(coefficient1 as u128, coefficient2 as u128)?,
            checked_pow(10u128, target_power as usize)?,
        )?)
    } else {
        checked_as_u64(checked_ceil_div(
            checked_mul(coefficient1 as u128, coefficient2 as u128)?,
            checked_pow(10u128, (-target_power) as usize)?,
        )?)
    }
}

/// Divide two decimal values given as (mantissa, exponent) pairs and
/// return the mantissa of the quotient scaled to `target_exponent`.
pub fn checked_decimal_div(
    coefficient1: u64,
    exponent1: i32,
    coefficient2: u64,
    exponent2: i32,
    target_exponent: i32,
) -> Result<u64> {
    if coefficient2 == 0 {
        msg!("Error: Overflow in {} / {}", coefficient1, coefficient2);
        return err!(StablehedgeError::MathOverflow);
    }
    if coefficient1 == 0 {
        return Ok(0);
    }
    // compute scale factor for the dividend so the quotient lands on the
    // target exponent without losing precision to an early division
    let mut scale_factor = 0;
    let mut target_power = checked_sub(checked_sub(exponent1, exponent2)?, target_exponent)?;
    if exponent1 > 0 {
        scale_factor = checked_add(scale_factor, exponent1)?;
    }
    if exponent2 < 0 {
        scale_factor = checked_sub(scale_factor, exponent2)?;
        target_power = checked_add(target_power, exponent2)?;
    }
    if target_exponent < 0 {
        scale_factor = checked_sub(scale_factor, target_exponent)?;
        target_power = checked_add(target_power, target_exponent)?;
    }
    let scaled_coeff1 = if scale_factor > 0 {
        checked_mul(
            coefficient1 as u128,
            checked_pow(10u128, scale_factor as usize)?,
        )?
    } else {
        coefficient1 as u128
    };

    if target_power >= 0 {
        checked_as_u64(checked_mul(
            checked_div(scaled_coeff1, coefficient2 as u128)?,
            checked_pow(10u128, target_power as usize)?,
        )?)
    } else {
        checked_as_u64(checked_div(
            checked_div(scaled_coeff1, coefficient2 as u128)?,
            checked_pow(10u128, (-target_power) as usize)?,
        )?)
    }
}

pub fn scale_to_exponent(arg: u64, exponent: i32, target_exponent: i32) -> Result<u64> {
    if target_exponent == exponent {
        return Ok(arg);
    }
    let delta = checked_sub(target_exponent, exponent)?;
    if delta > 0 {
        checked_div(arg, checked_pow(10u64, delta as usize)?)
    } else {
        checked_mul(arg, checked_pow(10u64, (-delta) as usize)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_checked_ceil_div() {
        assert_eq!(checked_ceil_div(10u64, 3).unwrap(), 4);
        assert_eq!(checked_ceil_div(9u64, 3).unwrap(), 3);
        assert_eq!(checked_ceil_div(0u64, 3).unwrap(), 0);
        assert!(checked_ceil_div(1u64, 0).is_err());
    }

    #[test]
    fn test_checked_decimal_mul() {
        // 2.5 * 4.0 = 10.0 at three different target scales
        assert_eq!(checked_decimal_mul(25, -1, 40, -1, -1).unwrap(), 100);
        assert_eq!(checked_decimal_mul(25, -1, 40, -1, 0).unwrap(), 10);
        assert_eq!(checked_decimal_mul(25, -1, 40, -1, -3).unwrap(), 10_000);
    }

    #[test]
    fn test_checked_decimal_div() {
        // 10.0 / 4.0 = 2.5
        assert_eq!(checked_decimal_div(100, -1, 40, -1, -1).unwrap(), 25);
        // rounds down on truncation
        assert_eq!(checked_decimal_div(10, 0, 3, 0, 0).unwrap(), 3);
        assert!(checked_decimal_div(10, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_checked_as_i64() {
        assert_eq!(checked_as_i64(5u64).unwrap(), 5i64);
        assert!(checked_as_i64(u64::MAX).is_err());
    }
}
