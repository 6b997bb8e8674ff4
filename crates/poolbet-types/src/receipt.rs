//! Receipt types for the PoolBet audit trail.
//!
//! Every successful state mutation (match created, stake placed, result
//! declared, payout claimed, administrator changed) produces a [`Receipt`]
//! whose hash commits to the canonical JSON encoding of its [`LedgerEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    Amount, Identity, MatchId, PoolSnapshot, PoolbetError, ReceiptId, Result, Side, Timestamp,
    constants::RECEIPT_DOMAIN,
};

/// The type of action a receipt proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptKind {
    MatchCreated,
    StakePlaced,
    ResultDeclared,
    PayoutClaimed,
    AdministratorChanged,
}

impl std::fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchCreated => write!(f, "MATCH_CREATED"),
            Self::StakePlaced => write!(f, "STAKE_PLACED"),
            Self::ResultDeclared => write!(f, "RESULT_DECLARED"),
            Self::PayoutClaimed => write!(f, "PAYOUT_CLAIMED"),
            Self::AdministratorChanged => write!(f, "ADMINISTRATOR_CHANGED"),
        }
    }
}

/// What happened, with enough detail to replay the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    MatchCreated {
        match_id: MatchId,
        title: String,
        start_timestamp: Timestamp,
        end_timestamp: Timestamp,
    },
    StakePlaced {
        match_id: MatchId,
        bettor: Identity,
        side: Side,
        amount: Amount,
        /// Bettor's accumulated stake on this side after the call.
        accumulated: Amount,
    },
    ResultDeclared {
        match_id: MatchId,
        snapshot: PoolSnapshot,
    },
    PayoutClaimed {
        match_id: MatchId,
        bettor: Identity,
        amount: Amount,
    },
    AdministratorChanged {
        previous: Identity,
        current: Identity,
    },
}

impl LedgerEvent {
    #[must_use]
    pub fn kind(&self) -> ReceiptKind {
        match self {
            Self::MatchCreated { .. } => ReceiptKind::MatchCreated,
            Self::StakePlaced { .. } => ReceiptKind::StakePlaced,
            Self::ResultDeclared { .. } => ReceiptKind::ResultDeclared,
            Self::PayoutClaimed { .. } => ReceiptKind::PayoutClaimed,
            Self::AdministratorChanged { .. } => ReceiptKind::AdministratorChanged,
        }
    }

    /// The match this event concerns, if any.
    #[must_use]
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Self::MatchCreated { match_id, .. }
            | Self::StakePlaced { match_id, .. }
            | Self::ResultDeclared { match_id, .. }
            | Self::PayoutClaimed { match_id, .. } => Some(*match_id),
            Self::AdministratorChanged { .. } => None,
        }
    }

    /// SHA-256 over `RECEIPT_DOMAIN || canonical_json(self)`.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let payload = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(RECEIPT_DOMAIN);
        hasher.update(&payload);
        let hash = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        Ok(out)
    }
}

/// An entry in the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub kind: ReceiptKind,
    /// Who invoked the operation.
    pub actor: Identity,
    pub event: LedgerEvent,
    /// Hash of the event payload (see [`LedgerEvent::digest`]).
    pub event_hash: [u8; 32],
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt for `event`, hashing its payload. `issued_at` is the
    /// engine's time (unix seconds), not the wall clock.
    pub fn seal(actor: Identity, event: LedgerEvent, issued_at: Timestamp) -> Result<Self> {
        let event_hash = event.digest()?;
        let issued_at = i64::try_from(issued_at)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or(PoolbetError::Overflow {
                context: "receipt timestamp",
            })?;
        Ok(Self {
            id: ReceiptId::new(),
            kind: event.kind(),
            actor,
            event,
            event_hash,
            issued_at,
        })
    }

    /// Recompute the payload hash and compare.
    pub fn verify(&self) -> Result<bool> {
        Ok(self.kind == self.event.kind() && self.event.digest()? == self.event_hash)
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.event_hash)
    }
}
