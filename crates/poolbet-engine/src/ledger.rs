//! Settlement ledger.
//!
//! Owns stake records, per-side pools, per-match escrow, resolution
//! snapshots, and claim state. Every mutation is split into a pure `plan_*`
//! step that performs all validation and checked arithmetic, and an
//! `apply_*` step that commits the precomputed values. A failed plan leaves
//! the ledger untouched.
//!
//! ## Claim ordering (checks-effects-interactions)
//!
//! 1. Check: match resolved, bettor has a stake, not yet claimed
//! 2. Effects: mark claimed, debit escrow, record withdrawal
//! 3. Interaction: the caller moves value out (see [`crate::PayoutSink`])
//!
//! A re-entrant claim issued during step 3 observes the effects of step 2.

use std::collections::HashMap;

use poolbet_types::{
    Amount, Identity, MatchId, Payout, PoolSnapshot, PoolTotals, PoolbetError, Result, Side,
    StakeKey, StakeRecord, Timestamp,
};

use crate::{
    admin::AdminRole, claims::ClaimGuard, conservation::EscrowConservation, payout,
    registry::MatchRegistry,
};

/// Fully validated stake, ready to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakePlan {
    pub key: StakeKey,
    pub amount: Amount,
    /// Record after accumulation.
    pub record: StakeRecord,
    /// Match pools after accumulation.
    pub pool: PoolTotals,
    /// Match escrow after accumulation.
    pub escrow: Amount,
}

/// Per-match stake accounting and payouts.
#[derive(Debug)]
pub struct SettlementLedger {
    stakes: HashMap<StakeKey, StakeRecord>,
    pools: HashMap<MatchId, PoolTotals>,
    escrow: HashMap<MatchId, Amount>,
    snapshots: HashMap<MatchId, PoolSnapshot>,
    claims: ClaimGuard,
    conservation: EscrowConservation,
    allow_hedging: bool,
}

impl SettlementLedger {
    /// Create an empty ledger. `allow_hedging` controls whether one bettor
    /// may back both sides of a match.
    #[must_use]
    pub fn new(allow_hedging: bool) -> Self {
        Self {
            stakes: HashMap::new(),
            pools: HashMap::new(),
            escrow: HashMap::new(),
            snapshots: HashMap::new(),
            claims: ClaimGuard::new(),
            conservation: EscrowConservation::new(),
            allow_hedging,
        }
    }

    // -----------------------------------------------------------------
    // Staking
    // -----------------------------------------------------------------

    /// Validate a stake against the registry and compute its effects.
    ///
    /// # Errors
    /// - `MatchNotFound`, `MatchClosed`, `OutsideWindow`, `ZeroAmount`
    /// - `OppositeSideStaked` when hedging is disabled
    /// - `Overflow` if any accumulator would exceed [`Amount`]
    pub fn plan_stake(
        &self,
        registry: &MatchRegistry,
        match_id: MatchId,
        side: Side,
        amount: Amount,
        bettor: Identity,
        now: Timestamp,
    ) -> Result<StakePlan> {
        let record = registry.get(match_id)?;
        if !record.is_active {
            return Err(PoolbetError::MatchClosed(match_id));
        }
        if !record.window_contains(now) {
            return Err(PoolbetError::OutsideWindow {
                now,
                start: record.start_timestamp,
                end: record.end_timestamp,
            });
        }
        if amount == 0 {
            return Err(PoolbetError::ZeroAmount);
        }
        if !self.allow_hedging && self.stake_of(match_id, bettor, side.opposite()) > 0 {
            return Err(PoolbetError::OppositeSideStaked {
                match_id,
                bettor,
                existing: side.opposite(),
            });
        }

        let key = StakeKey::new(match_id, bettor, side);
        let current = self.stakes.get(&key).copied().unwrap_or_default();
        let next = StakeRecord {
            amount: current
                .amount
                .checked_add(amount)
                .ok_or(PoolbetError::Overflow {
                    context: "stake accumulation",
                })?,
            entries: current.entries.saturating_add(1),
        };
        let pool = self.pool(match_id).with_added(side, amount)?;
        let escrow = self
            .escrow_of(match_id)
            .checked_add(amount)
            .ok_or(PoolbetError::Overflow {
                context: "escrow balance",
            })?;

        Ok(StakePlan {
            key,
            amount,
            record: next,
            pool,
            escrow,
        })
    }

    /// Commit a plan produced by [`plan_stake`](Self::plan_stake).
    pub(crate) fn apply_stake(&mut self, plan: &StakePlan) {
        let match_id = plan.key.match_id;
        self.stakes.insert(plan.key, plan.record);
        self.pools.insert(match_id, plan.pool);
        self.escrow.insert(match_id, plan.escrow);
        self.conservation.record_deposit(match_id, plan.amount);

        tracing::debug!(
            match_id = %match_id,
            bettor = %plan.key.bettor,
            side = %plan.key.side,
            amount = %plan.amount,
            accumulated = %plan.record.amount,
            "Stake accumulated"
        );
    }

    #[cfg(test)]
    pub(crate) fn place_stake(
        &mut self,
        registry: &MatchRegistry,
        match_id: MatchId,
        side: Side,
        amount: Amount,
        bettor: Identity,
        now: Timestamp,
    ) -> Result<StakeRecord> {
        let plan = self.plan_stake(registry, match_id, side, amount, bettor, now)?;
        self.apply_stake(&plan);
        Ok(plan.record)
    }

    // -----------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------

    /// Check a result declaration and compute the pool snapshot it would freeze.
    ///
    /// # Errors
    /// `Unauthorized`, `MatchNotFound`, `AlreadyResolved`.
    pub fn plan_resolution(
        &self,
        admin: &AdminRole,
        caller: Identity,
        registry: &MatchRegistry,
        match_id: MatchId,
        outcome: Side,
    ) -> Result<PoolSnapshot> {
        admin.ensure(caller)?;
        let record = registry.get(match_id)?;
        if !record.is_active {
            return Err(PoolbetError::AlreadyResolved(match_id));
        }
        Ok(PoolSnapshot::from_totals(outcome, self.pool(match_id)))
    }

    /// Close the match in the registry and store its snapshot.
    pub(crate) fn apply_resolution(
        &mut self,
        registry: &mut MatchRegistry,
        match_id: MatchId,
        snapshot: PoolSnapshot,
    ) -> Result<()> {
        registry.close(match_id, snapshot.outcome)?;
        self.snapshots.insert(match_id, snapshot);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn declare_result(
        &mut self,
        admin: &AdminRole,
        caller: Identity,
        registry: &mut MatchRegistry,
        match_id: MatchId,
        outcome: Side,
    ) -> Result<PoolSnapshot> {
        let snapshot = self.plan_resolution(admin, caller, registry, match_id, outcome)?;
        self.apply_resolution(registry, match_id, snapshot)?;
        Ok(snapshot)
    }

    // -----------------------------------------------------------------
    // Payouts
    // -----------------------------------------------------------------

    /// What `bettor` is owed on a resolved match. Pure.
    ///
    /// # Errors
    /// `MatchNotFound`, `NotResolved`, `Overflow`.
    pub fn compute_payout(
        &self,
        registry: &MatchRegistry,
        match_id: MatchId,
        bettor: Identity,
    ) -> Result<Amount> {
        let snapshot = self.resolved_snapshot(registry, match_id)?;
        let winning = self.stake_of(match_id, bettor, snapshot.outcome);
        let total = self.bettor_total(match_id, bettor)?;
        payout::compute_payout(snapshot, winning, total)
    }

    /// Checks and effects of a claim. The returned payout has already been
    /// debited from escrow and the claim is marked consumed.
    ///
    /// # Errors
    /// `MatchNotFound`, `NotResolved`, `NoStake`, `AlreadyClaimed`,
    /// `Overflow`, `ConservationViolation`.
    pub fn begin_claim(
        &mut self,
        registry: &MatchRegistry,
        match_id: MatchId,
        bettor: Identity,
    ) -> Result<Payout> {
        let amount = self.compute_payout(registry, match_id, bettor)?;
        if self.bettor_total(match_id, bettor)? == 0 {
            return Err(PoolbetError::NoStake { match_id, bettor });
        }
        if self.claims.is_claimed(match_id, bettor) {
            return Err(PoolbetError::AlreadyClaimed { match_id, bettor });
        }
        let escrow = self.escrow_of(match_id);
        let remaining = escrow
            .checked_sub(amount)
            .ok_or_else(|| PoolbetError::ConservationViolation {
                reason: format!("{match_id}: payout {amount} exceeds escrow {escrow}"),
            })?;

        self.claims.mark_claimed(match_id, bettor)?;
        self.escrow.insert(match_id, remaining);
        self.conservation.record_withdrawal(match_id, amount);

        Ok(Payout {
            match_id,
            bettor,
            amount,
        })
    }

    /// Undo the effects of [`begin_claim`](Self::begin_claim) after a failed transfer.
    pub(crate) fn revert_claim(&mut self, payout: &Payout) {
        self.claims.unmark(payout.match_id, payout.bettor);
        let slot = self.escrow.entry(payout.match_id).or_insert(0);
        *slot = slot.saturating_add(payout.amount);
        self.conservation
            .reverse_withdrawal(payout.match_id, payout.amount);
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    #[must_use]
    pub fn stake_of(&self, match_id: MatchId, bettor: Identity, side: Side) -> Amount {
        self.stakes
            .get(&StakeKey::new(match_id, bettor, side))
            .map_or(0, |r| r.amount)
    }

    /// Bettor's stake across both sides of a match.
    pub fn bettor_total(&self, match_id: MatchId, bettor: Identity) -> Result<Amount> {
        self.stake_of(match_id, bettor, Side::Win)
            .checked_add(self.stake_of(match_id, bettor, Side::Lose))
            .ok_or(PoolbetError::Overflow {
                context: "bettor total",
            })
    }

    /// All stake records on one match.
    pub fn stakes_for(
        &self,
        match_id: MatchId,
    ) -> impl Iterator<Item = (&StakeKey, &StakeRecord)> {
        self.stakes
            .iter()
            .filter(move |(key, _)| key.match_id == match_id)
    }

    #[must_use]
    pub fn pool(&self, match_id: MatchId) -> PoolTotals {
        self.pools.get(&match_id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn escrow_of(&self, match_id: MatchId) -> Amount {
        self.escrow.get(&match_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn snapshot(&self, match_id: MatchId) -> Option<&PoolSnapshot> {
        self.snapshots.get(&match_id)
    }

    #[must_use]
    pub fn has_claimed(&self, match_id: MatchId, bettor: Identity) -> bool {
        self.claims.is_claimed(match_id, bettor)
    }

    /// Sum of payouts already withdrawn from a match.
    #[must_use]
    pub fn total_paid(&self, match_id: MatchId) -> Amount {
        self.conservation.total_withdrawals(match_id)
    }

    /// Check every conservation relation for one match.
    ///
    /// # Errors
    /// Returns [`PoolbetError::ConservationViolation`] on any mismatch.
    pub fn verify_conservation(&self, match_id: MatchId) -> Result<()> {
        let stake_sum = self
            .stakes_for(match_id)
            .try_fold(Amount::default(), |acc, (_, r)| acc.checked_add(r.amount))
            .ok_or(PoolbetError::Overflow {
                context: "stake sum",
            })?;

        let pool_total = self.pool(match_id).total()?;
        if stake_sum != pool_total {
            return Err(PoolbetError::ConservationViolation {
                reason: format!("{match_id}: stake sum {stake_sum} != pool total {pool_total}"),
            });
        }

        self.conservation
            .verify(match_id, self.escrow_of(match_id), stake_sum)?;

        if let Some(snapshot) = self.snapshots.get(&match_id) {
            let ceiling = payout::payout_ceiling(snapshot)?;
            if ceiling != stake_sum {
                return Err(PoolbetError::ConservationViolation {
                    reason: format!(
                        "{match_id}: snapshot total {ceiling} != stake sum {stake_sum}"
                    ),
                });
            }
            let paid = self.total_paid(match_id);
            if paid > ceiling {
                return Err(PoolbetError::ConservationViolation {
                    reason: format!("{match_id}: paid {paid} exceeds pool {ceiling}"),
                });
            }
        }
        Ok(())
    }

    fn resolved_snapshot(
        &self,
        registry: &MatchRegistry,
        match_id: MatchId,
    ) -> Result<&PoolSnapshot> {
        let record = registry.get(match_id)?;
        if record.is_active {
            return Err(PoolbetError::NotResolved(match_id));
        }
        self.snapshots.get(&match_id).ok_or_else(|| {
            PoolbetError::Internal(format!("{match_id} resolved without a pool snapshot"))
        })
    }
}

impl Default for SettlementLedger {
    fn default() -> Self {
        Self::new(true)
    }
}
