//! Stake bookkeeping types.
//!
//! Stakes are keyed by `(match, bettor, side)` and only ever grow while the
//! match is active. Per-side aggregates live in [`PoolTotals`]; at resolution
//! they are frozen into a [`PoolSnapshot`] that payout math reads from.

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, MatchId, PoolbetError, Result, Side};

/// Storage key for one accumulated stake record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StakeKey {
    pub match_id: MatchId,
    pub bettor: Identity,
    pub side: Side,
}

impl StakeKey {
    #[must_use]
    pub fn new(match_id: MatchId, bettor: Identity, side: Side) -> Self {
        Self {
            match_id,
            bettor,
            side,
        }
    }
}

/// Accumulated stake for a [`StakeKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    /// Sum of every accepted stake on this key.
    pub amount: Amount,
    /// Number of separate `place_stake` calls folded into `amount`.
    pub entries: u32,
}

/// Per-side aggregate stake for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTotals {
    pub win: Amount,
    pub lose: Amount,
}

impl PoolTotals {
    /// Aggregate on one side.
    #[must_use]
    pub fn side(&self, side: Side) -> Amount {
        match side {
            Side::Win => self.win,
            Side::Lose => self.lose,
        }
    }

    /// Both sides combined.
    ///
    /// # Errors
    /// Returns [`PoolbetError::Overflow`] if the sum does not fit.
    pub fn total(&self) -> Result<Amount> {
        self.win.checked_add(self.lose).ok_or(PoolbetError::Overflow {
            context: "pool total",
        })
    }

    /// Return a copy with `amount` added to `side`, without touching `self`.
    pub fn with_added(&self, side: Side, amount: Amount) -> Result<Self> {
        let mut next = *self;
        let slot = match side {
            Side::Win => &mut next.win,
            Side::Lose => &mut next.lose,
        };
        *slot = slot.checked_add(amount).ok_or(PoolbetError::Overflow {
            context: "side pool accumulation",
        })?;
        next.total()?;
        Ok(next)
    }
}

/// Pool aggregates frozen at the moment a result is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub outcome: Side,
    pub winning_pool: Amount,
    pub losing_pool: Amount,
}

impl PoolSnapshot {
    #[must_use]
    pub fn from_totals(outcome: Side, totals: PoolTotals) -> Self {
        Self {
            outcome,
            winning_pool: totals.side(outcome),
            losing_pool: totals.side(outcome.opposite()),
        }
    }

    /// Total value escrowed for the match at resolution.
    pub fn total(&self) -> Result<Amount> {
        self.winning_pool
            .checked_add(self.losing_pool)
            .ok_or(PoolbetError::Overflow {
                context: "snapshot total",
            })
    }

    /// No one backed the declared outcome; every stake is refunded.
    #[must_use]
    pub fn is_refund(&self) -> bool {
        self.winning_pool == 0
    }
}

/// A payout owed to (or paid to) one bettor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub match_id: MatchId,
    pub bettor: Identity,
    pub amount: Amount,
}
