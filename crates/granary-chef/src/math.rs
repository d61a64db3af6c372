//! Wide fixed-point arithmetic.
//!
//! The accumulator is a `U256`. Products of a `U256` and a 128-bit
//! amount are formed in a `U512` and only the quotient is narrowed back,
//! so intermediate overflow is impossible and a quotient that does not
//! fit surfaces as [`ChefError::Overflow`].

use primitive_types::{U256, U512};

use crate::{ChefError, Result};

/// Compute `a * b / denominator`, rounding down.
///
/// # Errors
///
/// - [`ChefError::DivisionByZero`] if `denominator` is zero
/// - [`ChefError::Overflow`] if the quotient does not fit in 256 bits
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(ChefError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| ChefError::Overflow)
}

/// Narrow a 256-bit value to an amount.
///
/// # Errors
///
/// - [`ChefError::Overflow`] if `value` exceeds `u128::MAX`
pub fn to_amount(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(ChefError::Overflow);
    }
    Ok(value.as_u128())
}

/// Serde adapter: `U256` as a decimal string.
pub mod decimal {
    use primitive_types::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as a decimal string.
    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize from a decimal string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text = String::deserialize(deserializer)?;
        U256::from_dec_str(&text).map_err(|e| de::Error::custom(format!("{text:?}: {e:?}")))
    }
}
