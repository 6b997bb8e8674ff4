//! `BettingEngine`: the root state and boundary surface.
//!
//! Every mutating call takes `&mut self`, so mutations are serialized by
//! construction. Each call validates first (registry + ledger `plan_*`),
//! seals its receipt, then commits. A call that returns `Err` has changed
//! nothing.

use std::sync::Arc;

use poolbet_types::{
    Amount, EngineConfig, Identity, LedgerEvent, Match, MatchId, MatchView, Payout,
    PoolSnapshot, PoolTotals, Receipt, Result, Side, StakeRecord, Timestamp,
};

use crate::{
    admin::AdminRole,
    clock::Clock,
    journal::Journal,
    ledger::SettlementLedger,
    registry::{MatchRegistry, NewMatch},
    transfer::{DeferredSink, PayoutSink},
};

/// Pooled binary-outcome settlement engine.
pub struct BettingEngine {
    admin: AdminRole,
    registry: MatchRegistry,
    ledger: SettlementLedger,
    journal: Journal,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl BettingEngine {
    /// Deploy a new engine. `deployer` becomes the administrator.
    ///
    /// # Errors
    /// - `InvalidIdentity` if `deployer` is the zero identity
    /// - `Configuration` if `config` fails validation
    pub fn new(
        deployer: Identity,
        config: EngineConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let admin = AdminRole::new(deployer)?;

        tracing::info!(
            engine = poolbet_types::constants::ENGINE_NAME,
            administrator = %deployer,
            allow_hedging = config.allow_hedging,
            reject_elapsed_windows = config.reject_elapsed_windows,
            version = poolbet_types::constants::VERSION,
            "Betting engine deployed"
        );

        Ok(Self {
            admin,
            registry: MatchRegistry::new(),
            ledger: SettlementLedger::new(config.allow_hedging),
            journal: Journal::new(),
            config,
            clock: Arc::new(clock),
        })
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =================================================================
    // Administrator
    // =================================================================

    #[must_use]
    pub fn get_administrator(&self) -> Identity {
        self.admin.holder()
    }

    /// Hand the administrator role to `new_admin`.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidIdentity`.
    pub fn change_administrator(&mut self, caller: Identity, new_admin: Identity) -> Result<()> {
        self.admin.check_transfer(caller, new_admin)?;
        let receipt = Receipt::seal(
            caller,
            LedgerEvent::AdministratorChanged {
                previous: self.admin.holder(),
                current: new_admin,
            },
            self.now(),
        )?;

        let previous = self.admin.transfer(caller, new_admin)?;
        self.journal.record(receipt);

        tracing::info!(
            previous = %previous,
            current = %new_admin,
            "Administrator changed"
        );
        Ok(())
    }

    // =================================================================
    // Match registry
    // =================================================================

    /// Open a new match. Administrator only.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidWindow`, `WindowElapsed`, `InvalidTitle`.
    pub fn create_match(
        &mut self,
        caller: Identity,
        title: impl Into<String>,
        start_timestamp: Timestamp,
        end_timestamp: Timestamp,
    ) -> Result<MatchId> {
        let record = self.registry.prepare(
            &self.admin,
            caller,
            NewMatch {
                title: title.into(),
                start_timestamp,
                end_timestamp,
            },
            self.now(),
            self.config.reject_elapsed_windows,
            self.config.max_title_len,
        )?;
        let receipt = Receipt::seal(
            caller,
            LedgerEvent::MatchCreated {
                match_id: record.id,
                title: record.title.clone(),
                start_timestamp,
                end_timestamp,
            },
            self.now(),
        )?;

        let match_id = self.registry.append(record)?;
        self.journal.record(receipt);

        tracing::info!(
            match_id = %match_id,
            start = start_timestamp,
            end = end_timestamp,
            "Match created"
        );
        Ok(match_id)
    }

    #[must_use]
    pub fn total_matches(&self) -> u64 {
        self.registry.count()
    }

    /// Boundary read of a match.
    pub fn matches(&self, match_id: MatchId) -> Result<MatchView> {
        self.get_match(match_id).map(Match::view)
    }

    pub fn get_match(&self, match_id: MatchId) -> Result<&Match> {
        self.registry.get(match_id)
    }

    pub fn matches_iter(&self) -> impl Iterator<Item = &Match> {
        self.registry.iter()
    }

    /// Matches currently accepting stakes.
    #[must_use]
    pub fn active_matches(&self) -> Vec<&Match> {
        let now = self.now();
        self.matches_iter()
            .filter(|m| m.is_active && m.window_contains(now))
            .collect()
    }

    // =================================================================
    // Settlement ledger
    // =================================================================

    /// Stake `amount` on `side` of a match. The value is held in escrow
    /// until the match resolves and the bettor claims.
    ///
    /// # Errors
    /// `MatchNotFound`, `MatchClosed`, `OutsideWindow`, `ZeroAmount`,
    /// `OppositeSideStaked`, `Overflow`.
    pub fn place_bet(
        &mut self,
        bettor: Identity,
        match_id: MatchId,
        side: impl Into<Side>,
        amount: Amount,
    ) -> Result<StakeRecord> {
        let side = side.into();
        let now = self.now();
        let plan = self
            .ledger
            .plan_stake(&self.registry, match_id, side, amount, bettor, now)?;
        let receipt = Receipt::seal(
            bettor,
            LedgerEvent::StakePlaced {
                match_id,
                bettor,
                side,
                amount,
                accumulated: plan.record.amount,
            },
            now,
        )?;

        self.ledger.apply_stake(&plan);
        self.journal.record(receipt);
        Ok(plan.record)
    }

    /// Declare the winning side. Administrator only.
    ///
    /// # Errors
    /// `Unauthorized`, `MatchNotFound`, `AlreadyResolved`.
    pub fn declare_match_result(
        &mut self,
        caller: Identity,
        match_id: MatchId,
        outcome: impl Into<Side>,
    ) -> Result<PoolSnapshot> {
        let snapshot = self.ledger.plan_resolution(
            &self.admin,
            caller,
            &self.registry,
            match_id,
            outcome.into(),
        )?;
        let receipt = Receipt::seal(
            caller,
            LedgerEvent::ResultDeclared { match_id, snapshot },
            self.now(),
        )?;

        self.ledger
            .apply_resolution(&mut self.registry, match_id, snapshot)?;
        self.journal.record(receipt);

        tracing::info!(
            match_id = %match_id,
            outcome = %snapshot.outcome,
            winning_pool = %snapshot.winning_pool,
            losing_pool = %snapshot.losing_pool,
            refund = snapshot.is_refund(),
            "Match result declared"
        );
        Ok(snapshot)
    }

    /// What `bettor` is owed on a resolved match.
    pub fn compute_payout(&self, match_id: MatchId, bettor: Identity) -> Result<Amount> {
        self.ledger.compute_payout(&self.registry, match_id, bettor)
    }

    /// Consume the bettor's claim and return the payout for the host to
    /// transfer.
    pub fn claim(&mut self, match_id: MatchId, bettor: Identity) -> Result<Payout> {
        self.claim_with(match_id, bettor, &mut DeferredSink)
    }

    /// Consume the bettor's claim and transfer through `sink`.
    ///
    /// The claim is marked and escrow debited before `sink` runs. If the
    /// sink fails, those effects are rolled back and its error returned.
    /// Zero payouts (losing side) consume the claim without calling `sink`.
    ///
    /// # Errors
    /// `MatchNotFound`, `NotResolved`, `NoStake`, `AlreadyClaimed`,
    /// `Overflow`, or whatever `sink` returns.
    pub fn claim_with<S: PayoutSink + ?Sized>(
        &mut self,
        match_id: MatchId,
        bettor: Identity,
        sink: &mut S,
    ) -> Result<Payout> {
        let payout = self.ledger.begin_claim(&self.registry, match_id, bettor)?;

        let receipt = match Receipt::seal(
            bettor,
            LedgerEvent::PayoutClaimed {
                match_id,
                bettor,
                amount: payout.amount,
            },
            self.now(),
        ) {
            Ok(receipt) => receipt,
            Err(err) => {
                self.ledger.revert_claim(&payout);
                return Err(err);
            }
        };

        if payout.amount > 0 {
            if let Err(err) = sink.transfer(self, &payout) {
                tracing::warn!(
                    match_id = %match_id,
                    bettor = %bettor,
                    amount = %payout.amount,
                    error = %err,
                    "Payout transfer failed, claim rolled back"
                );
                self.ledger.revert_claim(&payout);
                return Err(err);
            }
        }

        self.journal.record(receipt);
        tracing::info!(
            match_id = %match_id,
            bettor = %bettor,
            amount = %payout.amount,
            "Payout claimed"
        );
        Ok(payout)
    }

    // =================================================================
    // Reads
    // =================================================================

    /// Per-side totals for a match.
    pub fn pool(&self, match_id: MatchId) -> Result<PoolTotals> {
        self.registry.get(match_id)?;
        Ok(self.ledger.pool(match_id))
    }

    /// Value currently held in escrow for a match.
    pub fn escrow_balance(&self, match_id: MatchId) -> Result<Amount> {
        self.registry.get(match_id)?;
        Ok(self.ledger.escrow_of(match_id))
    }

    #[must_use]
    pub fn stake_of(&self, match_id: MatchId, bettor: Identity, side: Side) -> Amount {
        self.ledger.stake_of(match_id, bettor, side)
    }

    #[must_use]
    pub fn has_claimed(&self, match_id: MatchId, bettor: Identity) -> bool {
        self.ledger.has_claimed(match_id, bettor)
    }

    /// Pools frozen at resolution, if the match is resolved.
    #[must_use]
    pub fn snapshot(&self, match_id: MatchId) -> Option<&PoolSnapshot> {
        self.ledger.snapshot(match_id)
    }

    /// Check the conservation relations for one match.
    pub fn verify_conservation(&self, match_id: MatchId) -> Result<()> {
        self.registry.get(match_id)?;
        self.ledger.verify_conservation(match_id)
    }

    /// Check the conservation relations for every match.
    pub fn verify_all(&self) -> Result<()> {
        self.matches_iter()
            .try_for_each(|m| self.ledger.verify_conservation(m.id))
    }

    #[must_use]
    pub fn receipts(&self) -> &[Receipt] {
        self.journal.as_slice()
    }

    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    #[must_use]
    pub fn ledger(&self) -> &SettlementLedger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use poolbet_types::{PoolbetError, ReceiptKind};

    const T0: Timestamp = 1_700_000_000;

    fn setup() -> (BettingEngine, Identity, ManualClock) {
        let owner = Identity::from_label("owner");
        let clock = ManualClock::new(T0);
        let engine = BettingEngine::new(owner, EngineConfig::default(), clock.clone()).unwrap();
        (engine, owner, clock)
    }

    #[test]
    fn deployer_is_administrator() {
        let (engine, owner, _) = setup();
        assert_eq!(engine.get_administrator(), owner);
        assert_eq!(engine.total_matches(), 0);
        assert!(engine.receipts().is_empty());
    }

    #[test]
    fn zero_deployer_rejected() {
        let err = BettingEngine::new(Identity::ZERO, EngineConfig::default(), ManualClock::new(0))
            .err()
            .unwrap();
        assert_eq!(err, PoolbetError::InvalidIdentity(Identity::ZERO));
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = EngineConfig {
            max_title_len: 0,
            ..EngineConfig::default()
        };
        let err = BettingEngine::new(Identity::from_label("owner"), cfg, ManualClock::new(0))
            .err()
            .unwrap();
        assert!(matches!(err, PoolbetError::Configuration(_)));
    }

    #[test]
    fn create_and_read_match() {
        let (mut engine, owner, _) = setup();
        let id = engine.create_match(owner, "Test Match", T0, T0 + 3600).unwrap();
        assert_eq!(id, MatchId(0));

        let view = engine.matches(id).unwrap();
        assert_eq!(view.title, "Test Match");
        assert_eq!(view.start_timestamp, T0);
        assert_eq!(view.end_timestamp, T0 + 3600);
        assert!(view.is_active);
        assert!(!view.outcome);

        assert_eq!(engine.journal().count_of(ReceiptKind::MatchCreated), 1);
    }

    #[test]
    fn receipts_carry_engine_time() {
        let (mut engine, owner, clock) = setup();
        let id = engine.create_match(owner, "Final", T0, T0 + 3600).unwrap();
        clock.set(T0 + 120);
        engine.place_bet(Identity::from_label("a"), id, true, 5).unwrap();

        let issued: Vec<i64> = engine
            .receipts()
            .iter()
            .map(|r| r.issued_at.timestamp())
            .collect();
        assert_eq!(issued, vec![1_700_000_000, 1_700_000_120]);
        assert_eq!(engine.get_match(id).unwrap().id, id);
    }

    #[test]
    fn active_matches_follow_clock() {
        let (mut engine, owner, clock) = setup();
        engine.create_match(owner, "Now", T0, T0 + 60).unwrap();
        engine.create_match(owner, "Later", T0 + 600, T0 + 900).unwrap();
        assert_eq!(engine.active_matches().len(), 1);

        clock.set(T0 + 700);
        let active = engine.active_matches();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Later");
    }

    #[test]
    fn failed_bet_records_no_receipt() {
        let (mut engine, owner, _) = setup();
        let id = engine.create_match(owner, "Final", T0, T0 + 3600).unwrap();
        let before = engine.receipts().len();
        assert!(engine.place_bet(Identity::from_label("a"), id, true, 0).is_err());
        assert_eq!(engine.receipts().len(), before);
    }

    #[test]
    fn declare_records_snapshot_and_closes() {
        let (mut engine, owner, _) = setup();
        let id = engine.create_match(owner, "Final Match", T0, T0 + 3600).unwrap();
        engine.declare_match_result(owner, id, true).unwrap();

        let view = engine.matches(id).unwrap();
        assert!(view.outcome);
        assert!(!view.is_active);
        assert_eq!(engine.snapshot(id).unwrap().outcome, Side::Win);
    }

    #[test]
    fn reads_on_unknown_match_fail() {
        let (engine, _, _) = setup();
        assert!(matches!(
            engine.pool(MatchId(4)).unwrap_err(),
            PoolbetError::MatchNotFound(_)
        ));
        assert!(engine.escrow_balance(MatchId(4)).is_err());
        assert!(engine.verify_conservation(MatchId(4)).is_err());
        assert!(engine.matches(MatchId(4)).is_err());
    }
}
