//! # Time Source
//!
//! The ledger's accrual math is driven entirely by "current time", which is
//! an external input supplied by whoever constructs the ledger. The ledger
//! does not attest or cross-validate it — a dishonest clock skews accrual,
//! and that is an accepted, documented limitation of the system.
//!
//! [`SystemClock`] reads the wall clock; [`ManualClock`] is a settable
//! clock for tests and scenario replay, shared through `Arc` so the holder
//! can advance time after the ledger has been constructed.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// A source of "now". Trusted blindly by the ledger.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock.
///
/// Starts at a fixed instant and only moves when told to. Interior
/// mutability lets a test hold an `Arc<ManualClock>`, hand a clone to the
/// ledger, and advance time between operations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += Duration::seconds(secs);
    }

    /// Sets the clock to an absolute instant. Moving backwards is allowed —
    /// the ledger clamps negative elapsed time rather than underflowing.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
