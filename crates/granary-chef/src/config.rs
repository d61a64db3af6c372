//! Pool construction parameters.
//!
//! ```toml
//! reward_per_second = "1e18"
//! start_time = 1700086400
//! # custody = "0x..."   # defaults to the account derived from "pool"
//! ```

use std::path::Path;

use granary_types::{AccountId, Amount, Timestamp, DEFAULT_CUSTODY_LABEL};
use serde::{Deserialize, Serialize};

use crate::{ChefError, Result};

/// Longest emission horizon the rate is checked against (100 years).
pub const MAX_EMISSION_HORIZON_SECS: u64 = 100 * 365 * 24 * 3600;

/// Construction parameters of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Reward tokens emitted per second, in base units.
    #[serde(with = "granary_types::amount::text")]
    pub reward_per_second: Amount,
    /// Emission begins at this Unix timestamp.
    #[serde(default)]
    pub start_time: Timestamp,
    /// The pool's own account in both token ledgers.
    #[serde(default = "default_custody")]
    pub custody: AccountId,
}

fn default_custody() -> AccountId {
    AccountId::from_label(DEFAULT_CUSTODY_LABEL)
}

impl PoolConfig {
    /// Config with the default custody account.
    pub fn new(reward_per_second: Amount, start_time: Timestamp) -> Self {
        Self {
            reward_per_second,
            start_time,
            custody: default_custody(),
        }
    }

    /// Check that the emission over [`MAX_EMISSION_HORIZON_SECS`] fits in 128 bits.
    ///
    /// # Errors
    ///
    /// - [`ChefError::InvalidConfig`] if it does not
    pub fn validate(&self) -> Result<()> {
        if self
            .reward_per_second
            .checked_mul(Amount::from(MAX_EMISSION_HORIZON_SECS))
            .is_none()
        {
            return Err(ChefError::InvalidConfig(format!(
                "reward_per_second {} overflows over a {MAX_EMISSION_HORIZON_SECS}s horizon",
                self.reward_per_second
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// - [`ChefError::InvalidConfig`] on parse or validation failure
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ChefError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    ///
    /// - [`ChefError::InvalidConfig`] if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChefError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use granary_types::UNIT;

    #[test]
    fn test_parse_minimal() {
        let config = PoolConfig::from_toml_str(r#"reward_per_second = "1e18""#).expect("parse");
        assert_eq!(config.reward_per_second, UNIT);
        assert_eq!(config.start_time, 0);
        assert_eq!(config.custody, AccountId::from_label("pool"));
    }

    #[test]
    fn test_parse_full() {
        let custody = AccountId::new([7; 20]);
        let doc = format!(
            "reward_per_second = 5\nstart_time = 1700000000\ncustody = \"{}\"\n",
            hex_of(&custody)
        );
        let config = PoolConfig::from_toml_str(&doc).expect("parse");
        assert_eq!(config.reward_per_second, 5);
        assert_eq!(config.start_time, 1_700_000_000);
        assert_eq!(config.custody, custody);
    }

    #[test]
    fn test_parse_custody_in_display_form() {
        let custody = AccountId::from_label("treasury");
        let doc = format!("reward_per_second = 5\ncustody = \"{custody}\"\n");
        let config = PoolConfig::from_toml_str(&doc).expect("parse 0x-prefixed custody");
        assert_eq!(config.custody, custody);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PoolConfig::new(10 * UNIT, 86_400);
        let text = toml::to_string(&config).expect("serialize");
        assert_eq!(PoolConfig::from_toml_str(&text).expect("parse"), config);
    }

    #[test]
    fn test_rejects_missing_rate() {
        assert!(matches!(
            PoolConfig::from_toml_str("start_time = 5"),
            Err(ChefError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_overflowing_rate() {
        let config = PoolConfig::new(Amount::MAX / 2, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rate_is_valid() {
        PoolConfig::new(0, 0).validate().expect("zero rate");
    }

    fn hex_of(id: &AccountId) -> String {
        id.as_bytes().iter().map(|b| format!("{b:02x}")).collect()
    }
}
