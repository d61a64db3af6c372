//! Scenario file.
//!
//! ```toml
//! genesis = 1700000000
//!
//! [pool]
//! reward_per_second = "1e18"
//! start_time = 1700086400
//!
//! [[accounts]]
//! label = "alice"
//! balance = "1000e18"
//!
//! [[steps]]
//! at = 1700086400
//! account = "alice"
//! action = "deposit"
//! amount = "10e18"
//! ```

use std::path::Path;

use granary_chef::PoolConfig;
use granary_types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Clock reading when the pool is created.
    #[serde(default)]
    pub genesis: Timestamp,
    /// Pool parameters.
    pub pool: PoolConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
    /// Token tickers.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Funded accounts.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    /// Operations to replay, in time order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Token tickers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Ticker of the staked token.
    #[serde(default = "default_deposit_symbol")]
    pub deposit_symbol: String,
    /// Ticker of the reward token.
    #[serde(default = "default_reward_symbol")]
    pub reward_symbol: String,
}

/// An account seeded with deposit tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Label the account id is derived from.
    pub label: String,
    /// Initial deposit-token balance.
    #[serde(with = "granary_types::amount::text")]
    pub balance: Amount,
    /// Grant the pool an unlimited allowance.
    #[serde(default = "default_true")]
    pub approve: bool,
}

/// One replayed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Clock reading for this step.
    pub at: Timestamp,
    /// Caller label. Ignored by `update_pool`.
    #[serde(default)]
    pub account: String,
    /// Operation.
    pub action: Action,
    /// Amount for deposit and withdraw operations.
    #[serde(default, with = "granary_types::amount::text")]
    pub amount: Amount,
}

/// Engine operation a step invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// [`Engine::deposit`](granary_chef::Engine::deposit)
    Deposit,
    /// [`Engine::withdraw`](granary_chef::Engine::withdraw)
    Withdraw,
    /// [`Engine::claim`](granary_chef::Engine::claim)
    Claim,
    /// [`Engine::claim_and_withdraw`](granary_chef::Engine::claim_and_withdraw)
    ClaimAndWithdraw,
    /// [`Engine::update_pool`](granary_chef::Engine::update_pool)
    UpdatePool,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_deposit_symbol() -> String {
    "LP".to_string()
}

fn default_reward_symbol() -> String {
    "RWD".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            deposit_symbol: default_deposit_symbol(),
            reward_symbol: default_reward_symbol(),
        }
    }
}

impl SimConfig {
    /// Load and validate a scenario file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a scenario.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check pool parameters and step ordering.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pool.validate()?;

        let mut previous = self.genesis;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at < previous {
                anyhow::bail!(
                    "step {index} at {} is earlier than the preceding time {previous}",
                    step.at
                );
            }
            if step.action != Action::UpdatePool && step.account.is_empty() {
                anyhow::bail!("step {index} ({:?}) has no account", step.action);
            }
            previous = step.at;
        }
        Ok(())
    }
}
