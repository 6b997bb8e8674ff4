//! Claim guard. Prevents double payment.
//!
//! Each `(match, bettor)` pair can be claimed once. Claiming again returns
//! [`PoolbetError::AlreadyClaimed`]. Unlike a cache, the set is never
//! evicted: forgetting a claim would re-open it.

use std::collections::HashSet;

use poolbet_types::{Identity, MatchId, PoolbetError, Result};

/// Set of `(match, bettor)` pairs whose payout has been consumed.
#[derive(Debug, Default)]
pub struct ClaimGuard {
    claimed: HashSet<(MatchId, Identity)>,
}

impl ClaimGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            claimed: HashSet::new(),
        }
    }

    /// Mark a claim as consumed.
    ///
    /// # Errors
    /// Returns [`PoolbetError::AlreadyClaimed`] if the pair was already marked.
    pub fn mark_claimed(&mut self, match_id: MatchId, bettor: Identity) -> Result<()> {
        if !self.claimed.insert((match_id, bettor)) {
            return Err(PoolbetError::AlreadyClaimed { match_id, bettor });
        }
        Ok(())
    }

    /// Undo a claim whose transfer failed.
    pub(crate) fn unmark(&mut self, match_id: MatchId, bettor: Identity) {
        self.claimed.remove(&(match_id, bettor));
    }

    #[must_use]
    pub fn is_claimed(&self, match_id: MatchId, bettor: Identity) -> bool {
        self.claimed.contains(&(match_id, bettor))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
