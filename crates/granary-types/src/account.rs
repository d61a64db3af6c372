//! Account identifiers.
//!
//! An [`AccountId`] is an opaque 20-byte address. Accounts that only
//! exist in configuration files or tests are derived from a
//! human-readable label with BLAKE3, so `"alice"` always maps to the
//! same id.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Length of an account identifier in bytes.
pub const ACCOUNT_ID_LEN: usize = 20;

/// BLAKE3 key-derivation context for label-derived accounts.
const LABEL_CONTEXT: &str = "granary v1 account-label";

/// A 20-byte account address.
///
/// Serialized as its `0x`-prefixed [`Display`](fmt::Display) form; the
/// prefix is optional when parsing.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

/// Error returned when parsing an [`AccountId`] from hex.
#[derive(Debug, thiserror::Error)]
pub enum ParseAccountError {
    /// The input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded input has the wrong length.
    #[error("account id must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl AccountId {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive an account from a label (first 20 bytes of a BLAKE3 derived key).
    pub fn from_label(label: &str) -> Self {
        let key = blake3::derive_key(LABEL_CONTEXT, label.as_bytes());
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes.copy_from_slice(&key[..ACCOUNT_ID_LEN]);
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "AccountId(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for AccountId {
    type Err = ParseAccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim_start_matches("0x"))?;
        let bytes: [u8; ACCOUNT_ID_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| ParseAccountError::InvalidLength(raw.len()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_deterministic() {
        assert_eq!(AccountId::from_label("alice"), AccountId::from_label("alice"));
        assert_ne!(AccountId::from_label("alice"), AccountId::from_label("bob"));
    }

    #[test]
    fn test_display_parses_back() {
        let id = AccountId::from_label("pool");
        let parsed: AccountId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<AccountId>();
        assert!(matches!(err, Err(ParseAccountError::InvalidLength(4))));
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        assert!("zz".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_serializes_as_display_form() {
        let id = AccountId::new([0xAB; ACCOUNT_ID_LEN]);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(ACCOUNT_ID_LEN)));
        let back: AccountId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserializes_without_prefix() {
        let id = AccountId::new([0x07; ACCOUNT_ID_LEN]);
        let json = format!("\"{}\"", "07".repeat(ACCOUNT_ID_LEN));
        let back: AccountId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_short_id() {
        assert!(serde_json::from_str::<AccountId>("\"0xdeadbeef\"").is_err());
    }
}
