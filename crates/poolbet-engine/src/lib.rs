//! # poolbet-engine
//!
//! **Settlement engine**: match registry, pooled staking, result
//! declaration, and proportional payouts behind a single administrator.
//!
//! ## Architecture
//!
//! [`BettingEngine`] owns every piece of state and is the only boundary:
//! 1. [`AdminRole`] gates match creation, result declaration, and role transfer
//! 2. [`MatchRegistry`] assigns sequential ids and enforces the one-way
//!    Active → Resolved transition
//! 3. [`SettlementLedger`] accumulates stakes into per-side pools and escrow,
//!    freezes a [`poolbet_types::PoolSnapshot`] on resolution, and consumes claims
//! 4. [`PayoutSink`] moves value out after the claim's effects are committed
//! 5. [`Journal`] keeps a hash-sealed receipt for every committed mutation
//!
//! ## Payout rule
//!
//! ```text
//! payout = w + floor(w * losing_pool / winning_pool)
//! ```
//!
//! where `w` is the bettor's stake on the winning side. When nobody backed
//! the winning side, every bettor is refunded their total stake.

pub mod admin;
pub mod claims;
pub mod clock;
pub mod conservation;
pub mod engine;
pub mod journal;
pub mod ledger;
pub mod payout;
pub mod registry;
pub mod transfer;

pub use admin::AdminRole;
pub use claims::ClaimGuard;
pub use clock::{Clock, ManualClock, SystemClock};
pub use conservation::EscrowConservation;
pub use engine::BettingEngine;
pub use journal::Journal;
pub use ledger::{SettlementLedger, StakePlan};
pub use payout::compute_payout;
pub use registry::{MatchRegistry, NewMatch};
pub use transfer::{DeferredSink, PayoutSink, RecordingSink};
