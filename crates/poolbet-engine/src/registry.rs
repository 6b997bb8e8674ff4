//! Match registry.
//!
//! Owns the append-only list of matches and the ACTIVE → RESOLVED state
//! machine. Match ids are positions in the list, so `get` is O(1) and ids
//! are never reused.

use poolbet_types::{
    Identity, Match, MatchId, MatchStatus, PoolbetError, Result, Side, Timestamp,
};

use crate::admin::AdminRole;

/// Parameters for a new match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub title: String,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
}

/// Append-only collection of matches.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: Vec<Match>,
}

impl MatchRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
        }
    }

    /// Number of matches ever created. Also the id of the next match.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.matches.len() as u64
    }

    /// Look up a match.
    ///
    /// # Errors
    /// Returns [`PoolbetError::MatchNotFound`] if `match_id >= count()`.
    pub fn get(&self, match_id: MatchId) -> Result<&Match> {
        match_id
            .index()
            .and_then(|i| self.matches.get(i))
            .ok_or(PoolbetError::MatchNotFound(match_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    /// Validate a creation request and return the record it would append.
    ///
    /// Pure: the registry is not modified.
    pub fn prepare(
        &self,
        admin: &AdminRole,
        caller: Identity,
        new: NewMatch,
        now: Timestamp,
        reject_elapsed: bool,
        max_title_len: usize,
    ) -> Result<Match> {
        admin.ensure(caller)?;

        if new.end_timestamp <= new.start_timestamp {
            return Err(PoolbetError::InvalidWindow {
                start: new.start_timestamp,
                end: new.end_timestamp,
            });
        }
        if reject_elapsed && new.end_timestamp <= now {
            return Err(PoolbetError::WindowElapsed {
                end: new.end_timestamp,
                now,
            });
        }
        if new.title.trim().is_empty() {
            return Err(PoolbetError::InvalidTitle {
                reason: "title is empty".into(),
            });
        }
        if new.title.len() > max_title_len {
            return Err(PoolbetError::InvalidTitle {
                reason: format!("{} bytes exceeds limit {max_title_len}", new.title.len()),
            });
        }

        Ok(Match {
            id: MatchId(self.count()),
            title: new.title,
            start_timestamp: new.start_timestamp,
            end_timestamp: new.end_timestamp,
            is_active: true,
            outcome: None,
        })
    }

    /// Append a record produced by [`prepare`](Self::prepare).
    pub(crate) fn append(&mut self, record: Match) -> Result<MatchId> {
        if record.id != MatchId(self.count()) {
            return Err(PoolbetError::Internal(format!(
                "stale match record {} (registry count {})",
                record.id,
                self.count()
            )));
        }
        let id = record.id;
        self.matches.push(record);
        Ok(id)
    }

    #[cfg(test)]
    pub(crate) fn create(
        &mut self,
        admin: &AdminRole,
        caller: Identity,
        new: NewMatch,
        now: Timestamp,
    ) -> Result<MatchId> {
        let record = self.prepare(
            admin,
            caller,
            new,
            now,
            true,
            poolbet_types::constants::DEFAULT_MAX_TITLE_LEN,
        )?;
        self.append(record)
    }

    /// Move a match to RESOLVED with `outcome`. Only the settlement
    /// ledger's resolve path calls this.
    ///
    /// # Errors
    /// - `MatchNotFound` if the id is unknown
    /// - `AlreadyResolved` if the match is no longer active
    pub(crate) fn close(&mut self, match_id: MatchId, outcome: Side) -> Result<()> {
        let record = match_id
            .index()
            .and_then(|i| self.matches.get_mut(i))
            .ok_or(PoolbetError::MatchNotFound(match_id))?;

        if !record.status().can_transition_to(MatchStatus::Resolved) {
            return Err(PoolbetError::AlreadyResolved(match_id));
        }

        record.outcome = Some(outcome);
        record.is_active = false;
        Ok(())
    }
}
