//! External value transfer.
//!
//! The engine never moves value itself. When a claim has been checked and
//! its effects committed, the host's [`PayoutSink`] performs the transfer.
//! The sink receives the engine mutably, so a hostile counterparty can call
//! back into it; any such call sees the claim already consumed.

use poolbet_types::{Amount, Payout, Result};

use crate::engine::BettingEngine;

/// Host hook that moves a payout out of escrow.
pub trait PayoutSink {
    /// Move `payout.amount` to `payout.bettor`.
    ///
    /// Returning an error aborts the claim and rolls back its effects.
    fn transfer(&mut self, engine: &mut BettingEngine, payout: &Payout) -> Result<()>;
}

/// Sink for hosts that settle after the call returns, using the returned [`Payout`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredSink;

impl PayoutSink for DeferredSink {
    fn transfer(&mut self, _engine: &mut BettingEngine, _payout: &Payout) -> Result<()> {
        Ok(())
    }
}

/// Sink that records every transfer it is asked to make.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub transfers: Vec<Payout>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            transfers: Vec::new(),
        }
    }

    /// Total value transferred so far.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.transfers.iter().map(|p| p.amount).sum()
    }
}

impl PayoutSink for RecordingSink {
    fn transfer(&mut self, _engine: &mut BettingEngine, payout: &Payout) -> Result<()> {
        self.transfers.push(*payout);
        Ok(())
    }
}
