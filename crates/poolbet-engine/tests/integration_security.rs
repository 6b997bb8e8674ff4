//! # Security Integration Tests
//!
//! Each test plays an attacker who knows the engine's code paths and tries
//! to move value it is not owed. The tests prove the attack fails and that
//! the failed attempt leaves no trace in engine state.
//!
//! | Attack                    | Defence                                    |
//! |---------------------------|--------------------------------------------|
//! | Impersonate administrator | `AdminRole::ensure` before any mutation    |
//! | Double claim              | `ClaimGuard` consumed once per bettor      |
//! | Re-entrant claim          | Claim marked before the sink runs          |
//! | Failed transfer           | Effects rolled back, claim retryable       |
//! | Late stake                | Inclusive window check                     |
//! | Pool overflow             | Checked arithmetic in the stake plan       |

use poolbet_engine::{BettingEngine, ManualClock, PayoutSink, RecordingSink};
use poolbet_types::*;

const T0: Timestamp = 1_700_000_000;

fn owner() -> Identity {
    Identity::from_label("owner")
}

fn alice() -> Identity {
    Identity::from_label("alice")
}

fn bob() -> Identity {
    Identity::from_label("bob")
}

fn mallory() -> Identity {
    Identity::from_label("mallory")
}

fn deploy() -> (BettingEngine, ManualClock) {
    let clock = ManualClock::new(T0);
    let engine = BettingEngine::new(owner(), EngineConfig::default(), clock.clone()).unwrap();
    (engine, clock)
}

/// Engine with one resolved match: alice won 100, bob lost 50.
fn resolved() -> (BettingEngine, MatchId) {
    let (mut engine, _) = deploy();
    let id = engine.create_match(owner(), "Final", T0, T0 + 3600).unwrap();
    engine.place_bet(alice(), id, true, 100).unwrap();
    engine.place_bet(bob(), id, false, 50).unwrap();
    engine.declare_match_result(owner(), id, true).unwrap();
    (engine, id)
}

// =========================================================================
// Administrator impersonation
// =========================================================================

#[test]
fn non_admin_calls_change_nothing() {
    let (mut engine, _) = deploy();
    let id = engine.create_match(owner(), "Final", T0, T0 + 3600).unwrap();
    let receipts = engine.receipts().len();

    let err = engine
        .create_match(mallory(), "Fake", T0, T0 + 60)
        .unwrap_err();
    assert_eq!(err, PoolbetError::Unauthorized { caller: mallory() });
    assert_eq!(engine.total_matches(), 1);

    let err = engine.declare_match_result(mallory(), id, false).unwrap_err();
    assert_eq!(err, PoolbetError::Unauthorized { caller: mallory() });
    assert!(engine.matches(id).unwrap().is_active);
    assert!(engine.snapshot(id).is_none());

    let err = engine.change_administrator(mallory(), mallory()).unwrap_err();
    assert_eq!(err, PoolbetError::Unauthorized { caller: mallory() });
    assert_eq!(engine.get_administrator(), owner());

    assert_eq!(engine.receipts().len(), receipts);
}

#[test]
fn administrator_cannot_be_handed_to_zero() {
    let (mut engine, _) = deploy();
    let err = engine
        .change_administrator(owner(), Identity::ZERO)
        .unwrap_err();
    assert_eq!(err, PoolbetError::InvalidIdentity(Identity::ZERO));
    assert_eq!(engine.get_administrator(), owner());
}

#[test]
fn result_cannot_be_declared_twice() {
    let (mut engine, id) = resolved();
    let err = engine.declare_match_result(owner(), id, false).unwrap_err();
    assert_eq!(err, PoolbetError::AlreadyResolved(id));
    assert_eq!(engine.snapshot(id).unwrap().outcome, Side::Win);
}

// =========================================================================
// Double claim
// =========================================================================

#[test]
fn second_claim_is_rejected() {
    let (mut engine, id) = resolved();
    assert_eq!(engine.claim(id, alice()).unwrap().amount, 150);

    let err = engine.claim(id, alice()).unwrap_err();
    assert_eq!(
        err,
        PoolbetError::AlreadyClaimed {
            match_id: id,
            bettor: alice()
        }
    );
    assert_eq!(engine.escrow_balance(id).unwrap(), 0);
}

#[test]
fn losing_claim_is_also_consumed_once() {
    let (mut engine, id) = resolved();
    assert_eq!(engine.claim(id, bob()).unwrap().amount, 0);
    assert!(matches!(
        engine.claim(id, bob()).unwrap_err(),
        PoolbetError::AlreadyClaimed { .. }
    ));
}

#[test]
fn stranger_has_nothing_to_claim() {
    let (mut engine, id) = resolved();
    assert!(matches!(
        engine.claim(id, mallory()).unwrap_err(),
        PoolbetError::NoStake { .. }
    ));
    assert!(!engine.has_claimed(id, mallory()));
}

#[test]
fn claim_before_resolution_is_rejected() {
    let (mut engine, _) = deploy();
    let id = engine.create_match(owner(), "Open", T0, T0 + 3600).unwrap();
    engine.place_bet(alice(), id, true, 10).unwrap();
    assert_eq!(
        engine.claim(id, alice()).unwrap_err(),
        PoolbetError::NotResolved(id)
    );
    assert_eq!(engine.escrow_balance(id).unwrap(), 10);
}

// =========================================================================
// Re-entrancy
// =========================================================================

/// Sink that calls back into the engine to claim the same payout again.
struct ReentrantSink {
    propagate: bool,
    nested: Option<Result<Payout>>,
}

impl PayoutSink for ReentrantSink {
    fn transfer(&mut self, engine: &mut BettingEngine, payout: &Payout) -> Result<()> {
        let nested = engine.claim(payout.match_id, payout.bettor);
        let outcome = match &nested {
            Err(err) if self.propagate => Err(err.clone()),
            _ => Ok(()),
        };
        self.nested = Some(nested);
        outcome
    }
}

#[test]
fn reentrant_claim_sees_consumed_claim() {
    let (mut engine, id) = resolved();
    let mut sink = ReentrantSink {
        propagate: false,
        nested: None,
    };

    let payout = engine.claim_with(id, alice(), &mut sink).unwrap();
    assert_eq!(payout.amount, 150);
    assert!(matches!(
        sink.nested,
        Some(Err(PoolbetError::AlreadyClaimed { .. }))
    ));

    // Paid exactly once.
    assert_eq!(engine.escrow_balance(id).unwrap(), 0);
    assert_eq!(engine.journal().count_of(ReceiptKind::PayoutClaimed), 1);
    engine.verify_conservation(id).unwrap();
}

#[test]
fn reentrant_failure_rolls_back_outer_claim() {
    let (mut engine, id) = resolved();
    let mut sink = ReentrantSink {
        propagate: true,
        nested: None,
    };

    let err = engine.claim_with(id, alice(), &mut sink).unwrap_err();
    assert!(matches!(err, PoolbetError::AlreadyClaimed { .. }));
    assert!(!engine.has_claimed(id, alice()));
    assert_eq!(engine.escrow_balance(id).unwrap(), 150);
    engine.verify_conservation(id).unwrap();
}

/// Sink that claims on behalf of another bettor mid-transfer.
struct CrossClaimSink {
    other: Identity,
    inner: RecordingSink,
}

impl PayoutSink for CrossClaimSink {
    fn transfer(&mut self, engine: &mut BettingEngine, payout: &Payout) -> Result<()> {
        if payout.bettor != self.other {
            engine.claim_with(payout.match_id, self.other, &mut self.inner)?;
        }
        self.inner.transfer(engine, payout)
    }
}

#[test]
fn nested_claim_for_other_bettor_keeps_conservation() {
    let (mut engine, _) = deploy();
    let id = engine.create_match(owner(), "Final", T0, T0 + 3600).unwrap();
    engine.place_bet(alice(), id, true, 60).unwrap();
    engine.place_bet(bob(), id, true, 40).unwrap();
    engine.place_bet(mallory(), id, false, 50).unwrap();
    engine.declare_match_result(owner(), id, true).unwrap();

    let mut sink = CrossClaimSink {
        other: bob(),
        inner: RecordingSink::new(),
    };
    engine.claim_with(id, alice(), &mut sink).unwrap();

    // 60 + floor(60*50/100) and 40 + floor(40*50/100)
    assert_eq!(sink.inner.total(), 90 + 60);
    assert!(engine.has_claimed(id, bob()));
    assert_eq!(engine.escrow_balance(id).unwrap(), 0);
    engine.verify_conservation(id).unwrap();
}

// =========================================================================
// Failed transfer
// =========================================================================

struct FailingSink;

impl PayoutSink for FailingSink {
    fn transfer(&mut self, _engine: &mut BettingEngine, payout: &Payout) -> Result<()> {
        Err(PoolbetError::TransferFailed {
            to: payout.bettor,
            amount: payout.amount,
            reason: "recipient rejected value".into(),
        })
    }
}

#[test]
fn failed_transfer_rolls_back_and_can_retry() {
    let (mut engine, id) = resolved();
    let receipts = engine.receipts().len();

    let err = engine.claim_with(id, alice(), &mut FailingSink).unwrap_err();
    assert!(matches!(err, PoolbetError::TransferFailed { amount: 150, .. }));
    assert!(!engine.has_claimed(id, alice()));
    assert_eq!(engine.escrow_balance(id).unwrap(), 150);
    assert_eq!(engine.receipts().len(), receipts);
    engine.verify_conservation(id).unwrap();

    let mut sink = RecordingSink::new();
    engine.claim_with(id, alice(), &mut sink).unwrap();
    assert_eq!(sink.total(), 150);
    assert!(engine.has_claimed(id, alice()));
}

#[test]
fn failing_sink_is_not_called_for_zero_payout() {
    let (mut engine, id) = resolved();
    let payout = engine.claim_with(id, bob(), &mut FailingSink).unwrap();
    assert_eq!(payout.amount, 0);
    assert!(engine.has_claimed(id, bob()));
}

// =========================================================================
// Window and arithmetic
// =========================================================================

#[test]
fn stakes_outside_window_leave_no_balance() {
    let (mut engine, clock) = deploy();
    let id = engine
        .create_match(owner(), "Later", T0 + 100, T0 + 200)
        .unwrap();

    let err = engine.place_bet(alice(), id, true, 10).unwrap_err();
    assert_eq!(
        err,
        PoolbetError::OutsideWindow {
            now: T0,
            start: T0 + 100,
            end: T0 + 200
        }
    );

    clock.set(T0 + 201);
    assert!(engine.place_bet(alice(), id, true, 10).is_err());

    assert_eq!(engine.stake_of(id, alice(), Side::Win), 0);
    assert_eq!(engine.escrow_balance(id).unwrap(), 0);
    assert_eq!(engine.pool(id).unwrap().total().unwrap(), 0);
}

#[test]
fn stake_after_resolution_is_closed() {
    let (mut engine, id) = resolved();
    assert_eq!(
        engine.place_bet(mallory(), id, true, 1).unwrap_err(),
        PoolbetError::MatchClosed(id)
    );
}

#[test]
fn pool_overflow_is_rejected_atomically() {
    let (mut engine, _) = deploy();
    let id = engine.create_match(owner(), "Whale", T0, T0 + 3600).unwrap();
    engine.place_bet(alice(), id, true, Amount::MAX).unwrap();

    let err = engine.place_bet(bob(), id, false, 1).unwrap_err();
    assert!(matches!(err, PoolbetError::Overflow { .. }));
    assert_eq!(engine.stake_of(id, bob(), Side::Lose), 0);
    assert_eq!(engine.escrow_balance(id).unwrap(), Amount::MAX);
    engine.verify_conservation(id).unwrap();
}
