// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TERMSTAKE Token Primitives
//!
//! Everything the staking ledger consumes but does not own: the two
//! fungible-balance collaborators it moves value through, the account
//! identities those balances are keyed by, and the time source its
//! accrual math reads from.
//!
//! The staking ledger never touches a balance directly — all custody
//! movement goes through [`Token::transfer`] and [`Token::transfer_from`],
//! and all timestamps come from a [`Clock`]. The clock is trusted blindly:
//! whoever supplies it controls accrual. That is a documented property of
//! the system, not an oversight.

pub mod address;
pub mod clock;
pub mod token;

pub use address::Address;
pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{Token, TokenError, TokenId};
