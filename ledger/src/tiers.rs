//! # Rate Tiers & Accrual Constants
//!
//! Every magic number in the accrual math lives here. The tier table is
//! fixed at compile time: lock durations are flat second counts (a day is
//! exactly 86 400 seconds, a rate year is 365 days), not calendar-aware.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in a day. Flat, never DST-adjusted.
pub const SECS_PER_DAY: u64 = 86_400;

/// The divisor that turns `percent * elapsed_seconds / SECS_PER_DAY` into
/// a yearly-rate share: 365 days times the percent scale of 100.
pub const RATE_YEAR_PERCENT_DAYS: u64 = 36_500;

/// Numerator of the early-exit payout: a locked position withdrawn before
/// maturity pays out 90% of principal and forfeits all reward.
pub const EARLY_EXIT_PAYOUT_PERCENT: u64 = 90;

/// A deposit's rate tier: how long the principal is locked and the nominal
/// annual reward rate it earns.
///
/// The wire encoding is a single byte code (0, 1, 2); anything else is
/// rejected at the deposit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateTier {
    /// No lock, withdrawable in full immediately. 10% nominal annual rate.
    NoLock,
    /// 182-day lock. 20% nominal annual rate.
    SixMonth,
    /// 365-day lock. 30% nominal annual rate.
    OneYear,
}

impl RateTier {
    /// Decodes a tier from its single-byte wire code.
    ///
    /// Returns `None` for codes outside the defined set; the ledger maps
    /// that to its `InvalidRateTier` rejection.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RateTier::NoLock),
            1 => Some(RateTier::SixMonth),
            2 => Some(RateTier::OneYear),
            _ => None,
        }
    }

    /// The tier's wire code.
    pub fn code(&self) -> u8 {
        match self {
            RateTier::NoLock => 0,
            RateTier::SixMonth => 1,
            RateTier::OneYear => 2,
        }
    }

    /// Lock duration in seconds. Zero for [`RateTier::NoLock`], which is
    /// why that tier can never hit the early-exit branch.
    pub fn lock_secs(&self) -> u64 {
        match self {
            RateTier::NoLock => 0,
            RateTier::SixMonth => 182 * SECS_PER_DAY,
            RateTier::OneYear => 365 * SECS_PER_DAY,
        }
    }

    /// Nominal annual reward rate, in whole percent.
    pub fn annual_rate_percent(&self) -> u64 {
        match self {
            RateTier::NoLock => 10,
            RateTier::SixMonth => 20,
            RateTier::OneYear => 30,
        }
    }
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateTier::NoLock => write!(f, "NoLock"),
            RateTier::SixMonth => write!(f, "SixMonth"),
            RateTier::OneYear => write!(f, "OneYear"),
        }
    }
}
