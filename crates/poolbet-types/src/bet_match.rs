//! Match model: a single bettable event with a window and a binary outcome.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  declare_result   ┌──────────┐
//!   │ ACTIVE ├──────────────────▶│ RESOLVED │
//!   └────────┘                   └──────────┘
//! ```
//!
//! `RESOLVED` is terminal. Stakes are accepted only while `ACTIVE` and inside
//! `[start_timestamp, end_timestamp]`; payouts are defined only once `RESOLVED`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MatchId, Timestamp};

/// One of the two outcomes a stake can back.
///
/// The boundary encoding is a boolean: `true` is [`Side::Win`], `false` is
/// [`Side::Lose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Win,
    Lose,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Win => Self::Lose,
            Self::Lose => Self::Win,
        }
    }

    #[must_use]
    pub fn as_bool(self) -> bool {
        matches!(self, Self::Win)
    }
}

impl From<bool> for Side {
    fn from(value: bool) -> Self {
        if value { Self::Win } else { Self::Lose }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => write!(f, "WIN"),
            Self::Lose => write!(f, "LOSE"),
        }
    }
}

/// Lifecycle state of a match, derived from `is_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Accepting stakes (subject to the time window).
    Active,
    /// Outcome declared. Terminal.
    Resolved,
}

impl MatchStatus {
    /// Can a match move from this status to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Resolved))
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Resolved => write!(f, "RESOLVED"),
        }
    }
}

/// A match record as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Opaque description, immutable after creation.
    pub title: String,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    /// `true` from creation until resolution; never flips back.
    pub is_active: bool,
    /// `None` until resolved.
    pub outcome: Option<Side>,
}

impl Match {
    #[must_use]
    pub fn status(&self) -> MatchStatus {
        if self.is_active {
            MatchStatus::Active
        } else {
            MatchStatus::Resolved
        }
    }

    /// Whether `now` falls inside the inclusive betting window.
    #[must_use]
    pub fn window_contains(&self, now: Timestamp) -> bool {
        (self.start_timestamp..=self.end_timestamp).contains(&now)
    }

    /// The declared outcome, only once the match is resolved.
    #[must_use]
    pub fn resolved_outcome(&self) -> Option<Side> {
        if self.is_active { None } else { self.outcome }
    }

    /// Flat read model handed to the presentation layer.
    #[must_use]
    pub fn view(&self) -> MatchView {
        MatchView {
            title: self.title.clone(),
            start_timestamp: self.start_timestamp,
            end_timestamp: self.end_timestamp,
            is_active: self.is_active,
            outcome: self.resolved_outcome().is_some_and(Side::as_bool),
        }
    }
}

/// Boundary view of a match: `outcome` reads `false` until resolved and is
/// only meaningful when `is_active == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub title: String,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub is_active: bool,
    pub outcome: bool,
}
