//! # poolbet-types
//!
//! Shared types, errors, and configuration for the **PoolBet** settlement engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`MatchId`], [`Identity`], [`ReceiptId`]
//! - **Match model**: [`Match`], [`MatchStatus`], [`MatchView`], [`Side`]
//! - **Stake model**: [`StakeKey`], [`StakeRecord`], [`PoolTotals`], [`PoolSnapshot`], [`Payout`]
//! - **Receipt model**: [`Receipt`], [`ReceiptKind`], [`LedgerEvent`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`PoolbetError`] with `PB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod bet_match;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod receipt;
pub mod stake;

pub use bet_match::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use receipt::*;
pub use stake::*;

/// Value unit moved into and out of escrow (smallest indivisible denomination).
pub type Amount = u128;

/// Unix-epoch seconds.
pub type Timestamp = u64;
