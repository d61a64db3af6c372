//! Scenario replay against in-memory ledgers.

use std::collections::BTreeMap;

use granary_chef::{ChefEvent, Engine, PoolState, Receipt};
use granary_ledger::{FungibleToken, ManualClock, MemoryToken, MintableToken};
use granary_types::{AccountId, Amount, Timestamp, DEFAULT_CUSTODY_LABEL};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Action, SimConfig, Step};

type SimEngine = Engine<MemoryToken, MemoryToken, ManualClock>;

/// Outcome of the whole replay.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Per-step outcomes, in replay order.
    pub steps: Vec<StepOutcome>,
    /// Final staker records.
    pub users: Vec<UserReport>,
    /// Final token balances of every known account, custody included.
    pub balances: Vec<BalanceReport>,
    /// Final pool state.
    pub pool: PoolState,
    /// Rewards minted into custody.
    pub total_emitted: Amount,
    /// Rewards paid to stakers.
    pub total_paid: Amount,
    /// Rewards still held by custody.
    pub custody_rewards: Amount,
    /// `total_emitted == total_paid + custody_rewards`.
    pub conserved: bool,
    /// Engine event log.
    pub events: Vec<ChefEvent>,
}

/// Result of one step.
#[derive(Debug, Serialize)]
pub struct StepOutcome {
    /// Position in the scenario.
    pub index: usize,
    /// Clock reading.
    pub at: Timestamp,
    /// Caller label.
    pub account: String,
    /// Operation.
    pub action: Action,
    /// Whether the engine accepted the operation.
    pub ok: bool,
    /// Rewards paid (or minted, for `update_pool`).
    pub reward: Amount,
    /// Deposit tokens moved.
    pub principal: Amount,
    /// Rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A staker's final position.
#[derive(Debug, Serialize)]
pub struct UserReport {
    /// Account label, or the hex id when unknown.
    pub label: String,
    /// Account id.
    pub account: AccountId,
    /// Staked amount.
    pub amount: Amount,
    /// Reward debt.
    pub reward_debt: Amount,
}

/// An account's final token balances.
#[derive(Debug, Serialize)]
pub struct BalanceReport {
    /// Account label.
    pub label: String,
    /// Account id.
    pub account: AccountId,
    /// Deposit-token balance.
    pub deposit: Amount,
    /// Reward-token balance.
    pub reward: Amount,
}

/// Build the engine described by `config`, replay its steps and report.
///
/// Rejected operations are recorded in the report; only setup failures
/// are returned as errors.
pub fn run(config: &SimConfig) -> anyhow::Result<Report> {
    let mut labels = BTreeMap::new();
    labels.insert(config.pool.custody, DEFAULT_CUSTODY_LABEL.to_string());

    let custody = config.pool.custody;
    let mut deposit_token = MemoryToken::new(&config.tokens.deposit_symbol);
    for account in &config.accounts {
        let id = AccountId::from_label(&account.label);
        deposit_token.mint(&id, &id, account.balance)?;
        if account.approve {
            deposit_token.approve(&id, &custody, Amount::MAX);
        }
        labels.insert(id, account.label.clone());
    }
    let reward_token = MemoryToken::with_minter(&config.tokens.reward_symbol, custody);

    let clock = ManualClock::new(config.genesis);
    let mut engine = Engine::new(config.pool.clone(), deposit_token, reward_token, clock.clone())?;

    info!(
        accounts = config.accounts.len(),
        steps = config.steps.len(),
        "replaying scenario"
    );

    let mut steps = Vec::with_capacity(config.steps.len());
    for (index, step) in config.steps.iter().enumerate() {
        clock.set(step.at);
        let who = AccountId::from_label(&step.account);
        if !step.account.is_empty() {
            labels.entry(who).or_insert_with(|| step.account.clone());
        }
        steps.push(apply_step(&mut engine, index, step, &who));
    }

    Ok(report(engine, steps, &labels))
}

fn apply_step(engine: &mut SimEngine, index: usize, step: &Step, who: &AccountId) -> StepOutcome {
    let result = match step.action {
        Action::Deposit => engine.deposit(who, step.amount),
        Action::Withdraw => engine.withdraw(who, step.amount),
        Action::Claim => engine.claim(who),
        Action::ClaimAndWithdraw => engine.claim_and_withdraw(who, step.amount),
        Action::UpdatePool => engine.update_pool().map(|minted| Receipt {
            reward: minted,
            time: step.at,
            ..Receipt::default()
        }),
    };

    let mut outcome = StepOutcome {
        index,
        at: step.at,
        account: step.account.clone(),
        action: step.action,
        ok: false,
        reward: 0,
        principal: 0,
        error: None,
    };
    match result {
        Ok(receipt) => {
            outcome.ok = true;
            outcome.reward = receipt.reward;
            outcome.principal = receipt.principal;
        }
        Err(e) => {
            warn!(
                index,
                action = ?step.action,
                account = %step.account,
                error = %e,
                "step rejected"
            );
            outcome.error = Some(e.to_string());
        }
    }
    outcome
}

fn report(
    mut engine: SimEngine,
    steps: Vec<StepOutcome>,
    labels: &BTreeMap<AccountId, String>,
) -> Report {
    let label_of = |id: &AccountId| labels.get(id).cloned().unwrap_or_else(|| id.to_string());

    let users = engine
        .stakers()
        .map(|(id, record)| UserReport {
            label: label_of(id),
            account: *id,
            amount: record.amount,
            reward_debt: record.reward_debt,
        })
        .collect();

    let balances = labels
        .keys()
        .map(|id| BalanceReport {
            label: label_of(id),
            account: *id,
            deposit: engine.deposit_token().balance_of(id),
            reward: engine.reward_token().balance_of(id),
        })
        .collect();

    let custody_rewards = engine.reward_token().balance_of(engine.custody());
    let total_emitted = engine.total_emitted();
    let total_paid = engine.total_paid();
    let conserved = total_paid
        .checked_add(custody_rewards)
        .is_some_and(|accounted| accounted == total_emitted);

    Report {
        steps,
        users,
        balances,
        pool: engine.pool().clone(),
        total_emitted,
        total_paid,
        custody_rewards,
        conserved,
        events: engine.take_events(),
    }
}
