//! # Scenario Replay
//!
//! A scenario is a JSON document describing a self-contained ledger run:
//! which accounts hold principal, how big the reward pool is, and an
//! ordered list of steps (deposits, clock advances, reward lookups,
//! withdrawals). Accounts are referred to by human-readable labels; each
//! label derives a stable address, so scenario files stay diffable.
//!
//! Rejected steps are recorded in the report rather than aborting the
//! replay — scenarios are as useful for demonstrating the ledger's
//! rejections as its happy paths.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use termstake_ledger::{LedgerEvent, StakingLedger};
use termstake_token::{Address, Clock, ManualClock, Token};

/// The account label reserved for the ledger's custody address.
const CUSTODY_LABEL: &str = "ledger-custody";

/// All scenarios start at the same instant; only relative time matters.
const SCENARIO_EPOCH: (i32, u32, u32) = (2026, 1, 1);

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A parsed scenario file.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Principal balances minted per account label. Every account is also
    /// approved towards custody for its full balance, so deposits work
    /// without explicit approval steps.
    #[serde(default)]
    pub accounts: BTreeMap<String, u64>,

    /// Reward units minted into ledger custody before the first step.
    #[serde(default)]
    pub reward_pool: u64,

    /// The ordered step list.
    pub steps: Vec<Step>,
}

/// One scenario step.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Deposit `amount` principal at `tier` (wire code 0/1/2) as `account`.
    Deposit {
        account: String,
        amount: u64,
        tier: u8,
    },
    /// Move the clock forward by `secs` seconds.
    Advance { secs: i64 },
    /// Read `(withdrawable, reward)` for a position.
    Rewards { id: u64 },
    /// Withdraw a position as `account`, paying out to `to` (defaults to
    /// the caller).
    Withdraw {
        account: String,
        id: u64,
        #[serde(default)]
        to: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The result of one replayed step.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// A deposit succeeded; `id` is the new position.
    Deposited { id: u64 },
    /// The clock moved.
    Advanced { secs: i64 },
    /// A reward lookup (never fails; unknown ids read as zeros).
    Rewards {
        id: u64,
        withdrawable: u64,
        reward: u64,
    },
    /// A withdrawal succeeded.
    Withdrawn {
        id: u64,
        withdrawable: u64,
        reward: u64,
    },
    /// The ledger rejected the step. The replay continues.
    Rejected { error: String },
}

/// Closing balances for one account label.
#[derive(Debug, Serialize)]
pub struct AccountBalances {
    pub principal: u64,
    pub reward: u64,
}

/// The full replay report, printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub struct Report {
    pub outcomes: Vec<StepOutcome>,
    pub events: Vec<LedgerEvent>,
    pub balances: BTreeMap<String, AccountBalances>,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Replays `scenario` against a fresh ledger and returns the report.
pub fn run(scenario: &Scenario) -> Result<Report> {
    let issuer = Address::from_label("issuer");
    let custody = Address::from_label(CUSTODY_LABEL);

    let staking = Arc::new(Mutex::new(Token::new("Stake Token", "STK", 8, &issuer)));
    let rewards = Arc::new(Mutex::new(Token::new("Reward Token", "RWD", 8, &issuer)));

    let (y, m, d) = SCENARIO_EPOCH;
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .context("invalid scenario epoch")?,
    ));

    // Fund and approve every named account up front.
    {
        let mut token = staking.lock();
        for (label, balance) in &scenario.accounts {
            let account = Address::from_label(label);
            token
                .mint(&account, *balance)
                .with_context(|| format!("minting principal for {label}"))?;
            token.approve(&account, &custody, *balance);
        }
    }
    if scenario.reward_pool > 0 {
        rewards
            .lock()
            .mint(&custody, scenario.reward_pool)
            .context("funding reward pool")?;
    }

    let mut ledger = StakingLedger::new(
        custody,
        Arc::clone(&staking),
        Arc::clone(&rewards),
        clock.clone() as Arc<dyn Clock + Send + Sync>,
    )
    .context("constructing ledger")?;

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = replay_step(&mut ledger, &clock, step);
        if let StepOutcome::Rejected { error } = &outcome {
            tracing::warn!(index, %error, "step rejected");
        }
        outcomes.push(outcome);
    }

    // Closing balances for every label the scenario touches — funded
    // accounts plus any withdrawal caller or destination — custody last.
    let mut labels: std::collections::BTreeSet<&str> =
        scenario.accounts.keys().map(String::as_str).collect();
    for step in &scenario.steps {
        if let Step::Withdraw { account, to, .. } = step {
            labels.insert(account.as_str());
            if let Some(to) = to {
                labels.insert(to.as_str());
            }
        }
    }

    let mut balances = BTreeMap::new();
    for label in labels {
        let account = Address::from_label(label);
        balances.insert(
            label.to_string(),
            AccountBalances {
                principal: staking.lock().balance_of(&account),
                reward: rewards.lock().balance_of(&account),
            },
        );
    }
    balances.insert(
        CUSTODY_LABEL.to_string(),
        AccountBalances {
            principal: staking.lock().balance_of(&custody),
            reward: rewards.lock().balance_of(&custody),
        },
    );

    Ok(Report {
        outcomes,
        events: ledger.events().to_vec(),
        balances,
    })
}

fn replay_step(ledger: &mut StakingLedger, clock: &ManualClock, step: &Step) -> StepOutcome {
    match step {
        Step::Deposit {
            account,
            amount,
            tier,
        } => {
            let caller = Address::from_label(account);
            match ledger.deposit(caller, *amount, *tier) {
                Ok(id) => StepOutcome::Deposited { id },
                Err(e) => StepOutcome::Rejected {
                    error: e.to_string(),
                },
            }
        }
        Step::Advance { secs } => {
            clock.advance_secs(*secs);
            tracing::debug!(secs, "clock advanced");
            StepOutcome::Advanced { secs: *secs }
        }
        Step::Rewards { id } => {
            let (withdrawable, reward) = ledger.lookup_rewards(*id);
            StepOutcome::Rewards {
                id: *id,
                withdrawable,
                reward,
            }
        }
        Step::Withdraw { account, id, to } => {
            let caller = Address::from_label(account);
            let destination = to
                .as_deref()
                .map(Address::from_label)
                .unwrap_or(caller);
            match ledger.withdraw(caller, *id, destination) {
                Ok((withdrawable, reward)) => StepOutcome::Withdrawn {
                    id: *id,
                    withdrawable,
                    reward,
                },
                Err(e) => StepOutcome::Rejected {
                    error: e.to_string(),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_round_trip() {
        let json = r#"{
            "accounts": { "alice": 10000 },
            "reward_pool": 1000,
            "steps": [
                { "op": "deposit", "account": "alice", "amount": 1000, "tier": 0 },
                { "op": "advance", "secs": 31536000 },
                { "op": "rewards", "id": 1 },
                { "op": "withdraw", "account": "alice", "id": 1 }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        let report = run(&scenario).unwrap();

        assert!(matches!(&report.outcomes[0], StepOutcome::Deposited { id: 1 }));
        assert!(matches!(
            &report.outcomes[2],
            StepOutcome::Rewards {
                withdrawable: 1000,
                reward: 100,
                ..
            }
        ));
        assert!(matches!(
            &report.outcomes[3],
            StepOutcome::Withdrawn {
                withdrawable: 1000,
                reward: 100,
                ..
            }
        ));
        assert_eq!(report.balances["alice"].principal, 10_000);
        assert_eq!(report.balances["alice"].reward, 100);
    }

    #[test]
    fn withdraw_destinations_appear_in_balances() {
        let json = r#"{
            "accounts": { "alice": 1000 },
            "reward_pool": 1000,
            "steps": [
                { "op": "deposit", "account": "alice", "amount": 1000, "tier": 0 },
                { "op": "advance", "secs": 31536000 },
                { "op": "withdraw", "account": "alice", "id": 1, "to": "alice-cold" }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        let report = run(&scenario).unwrap();

        // The payout destination is not a funded account, but its closing
        // balances still show up in the report.
        assert_eq!(report.balances["alice-cold"].principal, 1_000);
        assert_eq!(report.balances["alice-cold"].reward, 100);
        assert_eq!(report.balances["alice"].principal, 0);
    }

    #[test]
    fn rejected_steps_do_not_abort_the_replay() {
        let json = r#"{
            "accounts": { "alice": 1000 },
            "steps": [
                { "op": "deposit", "account": "alice", "amount": 0, "tier": 0 },
                { "op": "deposit", "account": "alice", "amount": 1000, "tier": 0 },
                { "op": "withdraw", "account": "bob", "id": 1 }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        let report = run(&scenario).unwrap();

        assert!(matches!(&report.outcomes[0], StepOutcome::Rejected { .. }));
        assert!(matches!(&report.outcomes[1], StepOutcome::Deposited { id: 1 }));
        assert!(matches!(&report.outcomes[2], StepOutcome::Rejected { .. }));
    }
}
