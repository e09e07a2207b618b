//! # TERMSTAKE Staking Ledger
//!
//! A deposit/reward ledger: a user locks a fungible balance for a chosen
//! term, accrues a second fungible reward balance at a term-dependent rate,
//! and later withdraws — in full with accrued reward once the term has
//! elapsed, or early at a fixed 10% penalty with zero reward.
//!
//! The whole system is one contract, [`StakingLedger`], plus the two
//! fungible-asset collaborators it moves value through (see
//! [`termstake_token`]). The ledger owns the accounting only: tiered rate
//! selection, time-based accrual, the early-exit penalty, and the
//! deposit/withdraw state machine.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — `checked_add`,
//!    `checked_sub`, and `u128` intermediates in the rate math.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//!    A position is `Active` or `Withdrawn`; "never existed" is the map's
//!    `None`, checked explicitly.
//! 3. Status flips before funds move. The withdraw path marks a position
//!    `Withdrawn` before any outbound transfer, so no call-out can observe
//!    a still-active position mid-withdrawal.
//! 4. Reads never fail. `lookup_rewards` on an unknown or withdrawn
//!    position answers `(0, 0)`; only the write path rejects.

pub mod staking;
pub mod tiers;

pub use staking::{LedgerError, LedgerEvent, Position, PositionStatus, StakingLedger};
pub use tiers::RateTier;
