//! # Staking Ledger Contract
//!
//! Implements the deposit/reward ledger. The lifecycle of a position is:
//!
//! 1. **Deposit** — the caller picks an amount and a [`RateTier`]; the
//!    ledger pulls the principal into custody and issues a position id.
//! 2. **Accrue** — reward accrues linearly on real elapsed time at the
//!    tier's nominal annual rate. Nothing moves; [`lookup_rewards`] is a
//!    pure read.
//! 3. **Withdraw** — after the lock term, the full principal plus accrued
//!    reward pay out. Before the term, a locked position pays 90% of
//!    principal and forfeits the reward entirely.
//!
//! Reward is simple (non-compounding) interest with floor division at each
//! step, and it keeps accruing on real elapsed time past the nominal lock
//! term — a position left unclaimed for a decade keeps earning. Both are
//! contractual behavior, not accidents of the math.
//!
//! [`lookup_rewards`]: StakingLedger::lookup_rewards

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use termstake_token::{Address, Clock, Token, TokenError};

use crate::tiers::{RateTier, EARLY_EXIT_PAYOUT_PERCENT, RATE_YEAR_PERCENT_DAYS, SECS_PER_DAY};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
///
/// Every failure is a synchronous precondition rejection: the operation
/// aborts with no partial state change.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Deposits must be strictly positive.
    #[error("invalid amount: deposit must be greater than zero")]
    InvalidAmount,

    /// The tier code is outside the defined set {0, 1, 2}.
    #[error("invalid rate tier code: {0}")]
    InvalidRateTier(u8),

    /// The position id was never issued.
    #[error("unknown position: {0}")]
    InvalidAsset(u64),

    /// The caller is not the recorded owner of the position.
    #[error("position {id} is not owned by caller {caller}")]
    UnownedAsset {
        /// The position being withdrawn.
        id: u64,
        /// The identity that attempted the withdrawal.
        caller: Address,
    },

    /// The position has already been withdrawn. Terminal — there is no
    /// second payout.
    #[error("position {0} has already been withdrawn")]
    AlreadyWithdrawn(u64),

    /// The principal token is the null identity.
    #[error("invalid staking token: null identity")]
    InvalidStakingToken,

    /// The reward token is the null identity.
    #[error("invalid reward token: null identity")]
    InvalidRewardToken,

    /// Principal and reward token are the same asset. If this were
    /// allowed, reward payouts would silently drain principal custody.
    #[error("invalid token pair: staking and reward token must be distinct")]
    InvalidTokenPair,

    /// A collaborator token operation failed (insufficient balance,
    /// allowance, or custody funding).
    #[error(transparent)]
    Token(#[from] TokenError),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The status of an issued position.
///
/// "Never issued" is not a variant: unknown ids are an explicit existence
/// check against the position map, not default-initialized memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Deposited and not yet withdrawn.
    Active,
    /// Withdrawn. Terminal — the status never leaves this state.
    Withdrawn,
}

/// One deposit record. Everything but `status` is write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// The depositor. Only this identity can withdraw.
    pub owner: Address,
    /// Principal amount pulled into custody at deposit time.
    pub principal: u64,
    /// When the deposit happened, per the ledger's clock.
    pub deposited_at: DateTime<Utc>,
    /// The rate tier chosen at deposit time.
    pub tier: RateTier,
    /// Current lifecycle status.
    pub status: PositionStatus,
}

/// Observable records for off-ledger indexers and auditors. Emitted exactly
/// once per successful deposit and once per successful withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A position was created.
    Deposit {
        /// The new position id.
        id: u64,
        /// The depositor.
        owner: Address,
        /// Principal amount.
        amount: u64,
        /// Chosen tier.
        tier: RateTier,
    },
    /// A position was withdrawn.
    Withdraw {
        /// The position id.
        id: u64,
        /// The recorded owner.
        owner: Address,
        /// Principal paid out (post-penalty if early).
        withdrawable: u64,
        /// Reward paid out (zero if early).
        reward: u64,
        /// Where the funds went.
        to: Address,
    },
}

/// The staking ledger.
///
/// Bound permanently at construction to a principal token it pulls deposits
/// from and a reward token it pays accrual out of. `custody` is the
/// ledger's own account on both tokens; only the ledger moves funds in or
/// out of it, and only through the tokens' transfer primitives.
///
/// The execution model is one operation at a time to completion — the
/// status-flip-before-transfer ordering in [`withdraw`](Self::withdraw) is
/// the entire concurrency story, standing in for a lock.
pub struct StakingLedger {
    /// The ledger's custody account on both tokens.
    custody: Address,
    /// Principal asset: pulled in on deposit, paid back out on withdraw.
    staking_token: Arc<Mutex<Token>>,
    /// Reward asset: paid out of a pre-funded custody balance.
    reward_token: Arc<Mutex<Token>>,
    /// The time source. Trusted blindly.
    clock: Arc<dyn Clock + Send + Sync>,
    /// Monotonic position counter. The post-increment value is the id of
    /// the newest position; ids are never reused.
    nonce: u64,
    /// All positions ever issued, keyed by id. Never deleted — withdrawn
    /// positions persist for auditability.
    positions: HashMap<u64, Position>,
    /// Append-only event log.
    events: Vec<LedgerEvent>,
}

impl StakingLedger {
    /// Creates a ledger bound to its two asset collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidStakingToken`] /
    /// [`LedgerError::InvalidRewardToken`] if either token carries the null
    /// identity, and [`LedgerError::InvalidTokenPair`] if both are the same
    /// asset.
    pub fn new(
        custody: Address,
        staking_token: Arc<Mutex<Token>>,
        reward_token: Arc<Mutex<Token>>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, LedgerError> {
        let staking_id = staking_token.lock().id();
        let reward_id = reward_token.lock().id();

        if staking_id.is_zero() {
            return Err(LedgerError::InvalidStakingToken);
        }
        if reward_id.is_zero() {
            return Err(LedgerError::InvalidRewardToken);
        }
        if staking_id == reward_id {
            return Err(LedgerError::InvalidTokenPair);
        }

        Ok(Self {
            custody,
            staking_token,
            reward_token,
            clock,
            nonce: 0,
            positions: HashMap::new(),
            events: Vec::new(),
        })
    }

    /// Deposits `amount` of the principal token at the given tier.
    ///
    /// Pulls the principal from `caller` into custody (the caller must have
    /// approved the custody account for at least `amount`), then issues a
    /// fresh position id. The pull happens before any state mutation, so a
    /// failed pull leaves the ledger untouched.
    ///
    /// The ledger keeps no owner → id index; the caller is responsible for
    /// remembering the returned id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] for a zero amount,
    /// [`LedgerError::InvalidRateTier`] for an undefined tier code, or a
    /// [`LedgerError::Token`] failure if the caller's balance or allowance
    /// does not cover the deposit.
    pub fn deposit(
        &mut self,
        caller: Address,
        amount: u64,
        tier_code: u8,
    ) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let tier =
            RateTier::from_code(tier_code).ok_or(LedgerError::InvalidRateTier(tier_code))?;

        let now = self.clock.now();

        // Pull the principal before touching ledger state. If this fails,
        // nothing else has happened.
        self.staking_token
            .lock()
            .transfer_from(&self.custody, &caller, &self.custody, amount)?;

        self.nonce += 1;
        let id = self.nonce;

        self.positions.insert(
            id,
            Position {
                owner: caller,
                principal: amount,
                deposited_at: now,
                tier,
                status: PositionStatus::Active,
            },
        );

        self.events.push(LedgerEvent::Deposit {
            id,
            owner: caller,
            amount,
            tier,
        });
        tracing::info!(id, owner = %caller, amount, tier = %tier, "deposit");

        Ok(id)
    }

    /// Returns `(withdrawable, reward)` for a position, read-only.
    ///
    /// Unknown and already-withdrawn positions answer `(0, 0)` — the read
    /// path never fails, in deliberate asymmetry with [`withdraw`]'s strict
    /// rejections. Idempotent: same id, same clock reading, same answer.
    ///
    /// [`withdraw`]: Self::withdraw
    pub fn lookup_rewards(&self, id: u64) -> (u64, u64) {
        match self.positions.get(&id) {
            Some(position) if position.status == PositionStatus::Active => {
                payout_at(position, self.clock.now())
            }
            _ => (0, 0),
        }
    }

    /// Withdraws a position, paying principal and reward to `to`.
    ///
    /// Exactly one withdrawal succeeds per position. The position's status
    /// flips to `Withdrawn` before either outbound transfer is made, so no
    /// call-out can ever observe a still-`Active` position mid-withdrawal.
    /// Custody balances are verified up front, keeping the whole operation
    /// all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAsset`] for an id never issued,
    /// [`LedgerError::UnownedAsset`] if `caller` is not the owner,
    /// [`LedgerError::AlreadyWithdrawn`] on a second attempt, or a
    /// [`LedgerError::Token`] failure if custody cannot cover the payout.
    pub fn withdraw(
        &mut self,
        caller: Address,
        id: u64,
        to: Address,
    ) -> Result<(u64, u64), LedgerError> {
        let now = self.clock.now();

        let position = self
            .positions
            .get_mut(&id)
            .ok_or(LedgerError::InvalidAsset(id))?;

        if position.owner != caller {
            return Err(LedgerError::UnownedAsset { id, caller });
        }
        if position.status == PositionStatus::Withdrawn {
            return Err(LedgerError::AlreadyWithdrawn(id));
        }

        let (withdrawable, reward) = payout_at(position, now);
        let owner = position.owner;

        // Verify custody can cover both payouts before mutating anything,
        // so the transfers below cannot fail and the operation stays
        // all-or-nothing.
        {
            let staking = self.staking_token.lock();
            let available = staking.balance_of(&self.custody);
            if available < withdrawable {
                return Err(TokenError::InsufficientBalance {
                    available,
                    requested: withdrawable,
                }
                .into());
            }
        }
        {
            let rewards = self.reward_token.lock();
            let available = rewards.balance_of(&self.custody);
            if available < reward {
                return Err(TokenError::InsufficientBalance {
                    available,
                    requested: reward,
                }
                .into());
            }
        }

        // Status flips before funds move. Reentrancy discipline: an
        // external transfer must never see this position still Active.
        position.status = PositionStatus::Withdrawn;

        if withdrawable > 0 {
            self.staking_token
                .lock()
                .transfer(&self.custody, &to, withdrawable)?;
        }
        if reward > 0 {
            self.reward_token
                .lock()
                .transfer(&self.custody, &to, reward)?;
        }

        self.events.push(LedgerEvent::Withdraw {
            id,
            owner,
            withdrawable,
            reward,
            to,
        });
        tracing::info!(id, owner = %owner, withdrawable, reward, to = %to, "withdraw");

        Ok((withdrawable, reward))
    }

    /// The current counter value: the id of the newest position, or 0 if
    /// nothing has ever been deposited.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The full record for a position, or `None` if the id was never issued.
    pub fn position(&self, id: u64) -> Option<&Position> {
        self.positions.get(&id)
    }

    /// The ledger's custody account.
    pub fn custody(&self) -> Address {
        self.custody
    }

    /// The append-only event log, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }
}

/// Computes `(withdrawable, reward)` for an active position at `now`.
///
/// Early exit (locked tier, before maturity): `principal * 90 / 100`, zero
/// reward. Matured (or `NoLock`, whose lock is zero): full principal, plus
/// `principal * elapsed_secs * rate_percent / 86_400 / 36_500` — simple
/// interest with floor division in exactly that order, prorated on real
/// elapsed time with no upper cap.
fn payout_at(position: &Position, now: DateTime<Utc>) -> (u64, u64) {
    // A clock that moved backwards reads as zero elapsed time.
    let elapsed = now
        .signed_duration_since(position.deposited_at)
        .num_seconds()
        .max(0) as u64;

    let lock = position.tier.lock_secs();
    if lock > 0 && elapsed < lock {
        let penalized =
            (position.principal as u128 * EARLY_EXIT_PAYOUT_PERCENT as u128 / 100) as u64;
        return (penalized, 0);
    }

    let withdrawable = position.principal;
    let reward = (withdrawable as u128)
        .checked_mul(elapsed as u128)
        .and_then(|x| x.checked_mul(position.tier.annual_rate_percent() as u128))
        .map(|x| x / SECS_PER_DAY as u128 / RATE_YEAR_PERCENT_DAYS as u128)
        .unwrap_or(u128::MAX);
    // The u128 product only saturates for astronomically distant clocks;
    // clamp rather than grow the read path an error surface.
    let reward = u64::try_from(reward).unwrap_or(u64::MAX);

    (withdrawable, reward)
}
