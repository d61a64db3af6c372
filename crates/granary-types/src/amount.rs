//! Amount parsing and text serialization.
//!
//! Token amounts routinely exceed `i64::MAX` (10 tokens with 18 decimals
//! is already `10^19`), which TOML integers cannot hold. Amounts in
//! configuration files are therefore written as strings, either plain
//! digits or `<mantissa>e<exponent>`:
//!
//! ```text
//! "1000"     -> 1000
//! "10e18"    -> 10_000_000_000_000_000_000
//! "1.5e18"   -> 1_500_000_000_000_000_000
//! ```

use crate::Amount;

/// Error returned by [`parse_amount`].
#[derive(Debug, thiserror::Error)]
pub enum ParseAmountError {
    /// The input is empty or contains unexpected characters.
    #[error("malformed amount: {0:?}")]
    Malformed(String),

    /// The fractional part has more digits than the exponent allows.
    #[error("amount {0:?} is not a whole number of base units")]
    Fractional(String),

    /// The value does not fit in 128 bits.
    #[error("amount {0:?} overflows u128")]
    Overflow(String),
}

/// Parse a decimal amount, optionally in scientific notation.
///
/// # Errors
///
/// - [`ParseAmountError::Malformed`] on syntax errors
/// - [`ParseAmountError::Fractional`] if the value is not an integer
/// - [`ParseAmountError::Overflow`] if the value exceeds `u128::MAX`
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let text = input.trim().replace('_', "");
    let malformed = || ParseAmountError::Malformed(input.to_string());

    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<u32>().map_err(|_| malformed())?),
        None => (text.as_str(), 0),
    };
    let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(malformed());
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let frac_digits = u32::try_from(frac.len()).map_err(|_| malformed())?;
    if frac_digits > exponent && frac.bytes().skip(exponent as usize).any(|b| b != b'0') {
        return Err(ParseAmountError::Fractional(input.to_string()));
    }

    let overflow = || ParseAmountError::Overflow(input.to_string());
    let mut value: Amount = 0;
    for digit in whole.bytes().chain(frac.bytes().take(exponent as usize)) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(Amount::from(digit - b'0')))
            .ok_or_else(overflow)?;
    }
    if value == 0 {
        return Ok(0);
    }
    let scale = exponent.saturating_sub(frac_digits);
    10u128
        .checked_pow(scale)
        .and_then(|factor| value.checked_mul(factor))
        .ok_or_else(overflow)
}

/// Serde adapter: serialize amounts as decimal strings, accept strings or integers.
///
/// ```ignore
/// #[serde(with = "granary_types::amount::text")]
/// pub reward_per_second: Amount,
/// ```
pub mod text {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use crate::Amount;

    /// Serialize as a decimal string.
    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize from a string (see [`parse_amount`](super::parse_amount)) or an integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl Visitor<'_> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or an amount string such as \"10e18\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            u64::try_from(v)
                .map(Amount::from)
                .map_err(|_| E::custom(format!("amount must be non-negative, got {v}")))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            super::parse_amount(v).map_err(E::custom)
        }
    }
}
