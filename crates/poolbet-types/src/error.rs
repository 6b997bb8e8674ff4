//! Error types for the PoolBet settlement engine.
//!
//! All errors use the `PB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Match registry errors
//! - 2xx: Staking errors
//! - 3xx: Settlement / claim errors
//! - 8xx: Access control errors
//! - 9xx: General / internal errors
//!
//! Every error aborts the whole operation; callers observe either the full
//! effect of a call or none of it.

use thiserror::Error;

use crate::{Amount, Identity, MatchId, Side, Timestamp};

/// Central error enum for all PoolBet operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolbetError {
    // =================================================================
    // Registry Errors (1xx)
    // =================================================================
    /// No match with this id has been created.
    #[error("PB_ERR_100: Match not found: {0}")]
    MatchNotFound(MatchId),

    /// The betting window is empty or inverted.
    #[error("PB_ERR_101: Invalid window: end {end} must be after start {start}")]
    InvalidWindow { start: Timestamp, end: Timestamp },

    /// The betting window closed before the match was created.
    #[error("PB_ERR_102: Window already elapsed: end {end} <= now {now}")]
    WindowElapsed { end: Timestamp, now: Timestamp },

    /// The title is empty or over the configured limit.
    #[error("PB_ERR_103: Invalid title: {reason}")]
    InvalidTitle { reason: String },

    // =================================================================
    // Staking Errors (2xx)
    // =================================================================
    /// The match has been resolved; no further stakes are accepted.
    #[error("PB_ERR_200: Match closed: {0}")]
    MatchClosed(MatchId),

    /// The stake arrived outside `[start, end]`.
    #[error("PB_ERR_201: Outside betting window: now {now} not in [{start}, {end}]")]
    OutsideWindow {
        now: Timestamp,
        start: Timestamp,
        end: Timestamp,
    },

    /// Stakes must carry a positive amount.
    #[error("PB_ERR_202: Stake amount must be greater than zero")]
    ZeroAmount,

    /// Hedging is disabled and the bettor already backs the other side.
    #[error("PB_ERR_203: Bettor {bettor} already staked {existing} on {match_id}")]
    OppositeSideStaked {
        match_id: MatchId,
        bettor: Identity,
        existing: Side,
    },

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// The result for this match was already declared.
    #[error("PB_ERR_300: Match already resolved: {0}")]
    AlreadyResolved(MatchId),

    /// Payouts are only defined once the match is resolved.
    #[error("PB_ERR_301: Match not resolved yet: {0}")]
    NotResolved(MatchId),

    /// The bettor already withdrew their share of this match.
    #[error("PB_ERR_302: Payout already claimed by {bettor} on {match_id}")]
    AlreadyClaimed { match_id: MatchId, bettor: Identity },

    /// The bettor never staked on this match.
    #[error("PB_ERR_303: No stake from {bettor} on {match_id}")]
    NoStake { match_id: MatchId, bettor: Identity },

    /// The external value transfer failed; the claim was rolled back.
    #[error("PB_ERR_304: Transfer of {amount} to {to} failed: {reason}")]
    TransferFailed {
        to: Identity,
        amount: Amount,
        reason: String,
    },

    /// Escrow conservation invariant violated. Critical safety alert.
    #[error("PB_ERR_305: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Access Control Errors (8xx)
    // =================================================================
    /// A non-administrator attempted a privileged call.
    #[error("PB_ERR_800: Unauthorized caller: {caller}")]
    Unauthorized { caller: Identity },

    /// The identity is empty and cannot hold a role.
    #[error("PB_ERR_801: Invalid identity: {0}")]
    InvalidIdentity(Identity),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked arithmetic overflowed.
    #[error("PB_ERR_900: Arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    /// Serialization / deserialization error.
    #[error("PB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (malformed JSON, out-of-range limits).
    #[error("PB_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable internal error.
    #[error("PB_ERR_903: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PoolbetError>;

impl From<serde_json::Error> for PoolbetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
