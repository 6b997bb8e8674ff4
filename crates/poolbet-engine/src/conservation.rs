//! Escrow conservation invariant checker.
//!
//! Per match, at every point in time:
//! ```text
//! escrow == Σ(stakes in) - Σ(payouts out)
//! Σ(payouts out) <= Σ(stakes in)
//! ```
//!
//! Stakes in only grow while the match is active; payouts out only grow
//! after it resolves. If either relation breaks, value was created or
//! destroyed and the engine reports a critical violation.

use std::collections::HashMap;

use poolbet_types::{Amount, MatchId, PoolbetError, Result};

/// Tracks per-match deposit and withdrawal totals.
#[derive(Debug, Default)]
pub struct EscrowConservation {
    deposits: HashMap<MatchId, Amount>,
    withdrawals: HashMap<MatchId, Amount>,
}

impl EscrowConservation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deposits: HashMap::new(),
            withdrawals: HashMap::new(),
        }
    }

    /// Record value entering a match's escrow.
    ///
    /// Deposits are bounded by the match's pool total, which the ledger
    /// has already checked for overflow.
    pub fn record_deposit(&mut self, match_id: MatchId, amount: Amount) {
        let slot = self.deposits.entry(match_id).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Record value leaving a match's escrow.
    pub fn record_withdrawal(&mut self, match_id: MatchId, amount: Amount) {
        let slot = self.withdrawals.entry(match_id).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Roll back a withdrawal whose transfer failed.
    pub(crate) fn reverse_withdrawal(&mut self, match_id: MatchId, amount: Amount) {
        if let Some(slot) = self.withdrawals.get_mut(&match_id) {
            *slot = slot.saturating_sub(amount);
        }
    }

    #[must_use]
    pub fn total_deposits(&self, match_id: MatchId) -> Amount {
        self.deposits.get(&match_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_withdrawals(&self, match_id: MatchId) -> Amount {
        self.withdrawals.get(&match_id).copied().unwrap_or(0)
    }

    /// Expected escrow: deposits - withdrawals.
    ///
    /// # Errors
    /// Returns [`PoolbetError::ConservationViolation`] if more has left the
    /// match than ever entered it.
    pub fn expected_escrow(&self, match_id: MatchId) -> Result<Amount> {
        let deposited = self.total_deposits(match_id);
        let withdrawn = self.total_withdrawals(match_id);
        deposited
            .checked_sub(withdrawn)
            .ok_or_else(|| PoolbetError::ConservationViolation {
                reason: format!(
                    "{match_id}: withdrawals {withdrawn} exceed deposits {deposited}"
                ),
            })
    }

    /// Verify the actual escrow balance and stake sum against the recorded
    /// flows for one match.
    ///
    /// # Errors
    /// Returns [`PoolbetError::ConservationViolation`] on any mismatch.
    pub fn verify(
        &self,
        match_id: MatchId,
        actual_escrow: Amount,
        stake_sum: Amount,
    ) -> Result<()> {
        let deposited = self.total_deposits(match_id);
        if stake_sum != deposited {
            return Err(PoolbetError::ConservationViolation {
                reason: format!(
                    "{match_id}: stake sum {stake_sum} != deposits {deposited}"
                ),
            });
        }
        let expected = self.expected_escrow(match_id)?;
        if actual_escrow != expected {
            return Err(PoolbetError::ConservationViolation {
                reason: format!(
                    "{match_id}: escrow {actual_escrow} != expected {expected} \
                     (deposits={deposited}, withdrawals={})",
                    self.total_withdrawals(match_id),
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_match_is_zero() {
        let ec = EscrowConservation::new();
        assert_eq!(ec.expected_escrow(MatchId(0)).unwrap(), 0);
        assert!(ec.verify(MatchId(0), 0, 0).is_ok());
    }

    #[test]
    fn deposits_increase_expected() {
        let mut ec = EscrowConservation::new();
        ec.record_deposit(MatchId(0), 100);
        ec.record_deposit(MatchId(0), 50);
        assert_eq!(ec.expected_escrow(MatchId(0)).unwrap(), 150);
    }

    #[test]
    fn withdrawals_decrease_expected() {
        let mut ec = EscrowConservation::new();
        ec.record_deposit(MatchId(0), 150);
        ec.record_withdrawal(MatchId(0), 149);
        assert_eq!(ec.expected_escrow(MatchId(0)).unwrap(), 1);
        assert!(ec.verify(MatchId(0), 1, 150).is_ok());
    }

    #[test]
    fn over_withdrawal_is_violation() {
        let mut ec = EscrowConservation::new();
        ec.record_deposit(MatchId(0), 10);
        ec.record_withdrawal(MatchId(0), 11);
        assert!(matches!(
            ec.expected_escrow(MatchId(0)).unwrap_err(),
            PoolbetError::ConservationViolation { .. }
        ));
    }

    #[test]
    fn escrow_mismatch_is_violation() {
        let mut ec = EscrowConservation::new();
        ec.record_deposit(MatchId(0), 10);
        assert!(ec.verify(MatchId(0), 11, 10).is_err());
        assert!(ec.verify(MatchId(0), 10, 9).is_err());
    }

    #[test]
    fn reversal_restores_expected() {
        let mut ec = EscrowConservation::new();
        ec.record_deposit(MatchId(3), 40);
        ec.record_withdrawal(MatchId(3), 40);
        ec.reverse_withdrawal(MatchId(3), 40);
        assert_eq!(ec.expected_escrow(MatchId(3)).unwrap(), 40);
    }

    #[test]
    fn matches_are_independent() {
        let mut ec = EscrowConservation::new();
        ec.record_deposit(MatchId(1), 5);
        ec.record_deposit(MatchId(0), 7);
        assert!(ec.verify(MatchId(0), 7, 7).is_ok());
        assert!(ec.verify(MatchId(1), 5, 5).is_ok());
    }
}
