//! Tests for the ledger state: save/delete/close flows, privilege rules,
//! and the materialized-cache invariant after every mutation path.

use coop_cash_engine::core::date::EventDate;
use coop_cash_engine::models::Movement;
use coop_cash_engine::{Actor, LedgerError, LedgerState};

fn date(s: &str) -> EventDate {
    EventDate::new(s).unwrap()
}

fn movement(participant: &str) -> Movement {
    Movement::for_participant(participant)
}

fn base_state() -> LedgerState {
    let mut state = LedgerState::default();
    let op = Actor::member("op");
    state.add_participant(&op, "p1", "Ada").unwrap();
    state.add_participant(&op, "p2", "Bruno").unwrap();
    state
}

// ==========================================
// Saving deliveries
// ==========================================

#[test]
fn test_save_writes_drawer_arithmetic() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m1 = movement("p1");
    m1.amount_settled = 10.0;
    m1.amount_to_supplier = 8.0;
    let mut m2 = movement("p2");
    m2.amount_settled = 5.0;
    m2.amount_to_supplier = 4.0;

    state
        .save_delivery(&op, date("2026-01-10"), 30.0, vec![m1, m2])
        .unwrap();

    let d = state.delivery(&date("2026-01-10")).unwrap();
    assert_eq!(d.cash_found, 30.0); // first delivery keeps its seed
    assert_eq!(d.cash_paid_to_supplier, 12.0);
    assert_eq!(d.cash_left, 33.0); // 30 + 15 - 12
    state.verify().unwrap();
}

#[test]
fn test_second_delivery_opens_with_previous_closing() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.amount_settled = 20.0;
    state
        .save_delivery(&op, date("2026-01-10"), 30.0, vec![m])
        .unwrap();

    // The operator reports 999 in the drawer; the chain knows better.
    state
        .save_delivery(&op, date("2026-01-17"), 999.0, vec![])
        .unwrap();

    let second = state.delivery(&date("2026-01-17")).unwrap();
    assert_eq!(second.cash_found, 50.0);
    assert_eq!(second.cash_left, 50.0);
    state.verify().unwrap();
}

#[test]
fn test_zero_closing_cash_propagates() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.amount_to_supplier = 30.0;
    state
        .save_delivery(&op, date("2026-01-10"), 30.0, vec![m])
        .unwrap();
    state
        .save_delivery(&op, date("2026-01-17"), 5.0, vec![])
        .unwrap();

    // The first drawer closed at exactly zero; that zero must propagate,
    // not be mistaken for "no previous delivery".
    assert_eq!(state.delivery(&date("2026-01-10")).unwrap().cash_left, 0.0);
    assert_eq!(state.delivery(&date("2026-01-17")).unwrap().cash_found, 0.0);
}

#[test]
fn test_save_updates_balances_incrementally() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.credit_left = 5.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, 5.0);
    assert_eq!(
        state.participant("p1").unwrap().last_modified,
        Some(date("2026-01-10"))
    );

    // Re-save the same (latest) delivery with a different movement.
    let mut m = movement("p1");
    m.use_credit = 2.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, -2.0);
    state.verify().unwrap();
}

#[test]
fn test_resave_replaces_movements_not_stacks_them() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.credit_left = 5.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m.clone()])
        .unwrap();
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m])
        .unwrap();

    // Same movement re-saved: balance stays 5, not 10.
    assert_eq!(state.participant("p1").unwrap().balance, 5.0);
    assert_eq!(state.movements_for(&date("2026-01-10")).len(), 1);
}

#[test]
fn test_resave_replacing_settle_all_refolds_history() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut jan = movement("p1");
    jan.credit_left = 100.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![jan])
        .unwrap();

    let mut feb = movement("p1");
    feb.settle_all = true;
    state
        .save_delivery(&op, date("2026-02-10"), 0.0, vec![feb])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, 0.0);

    // Replace the wipe with a plain credit. The wiped-out January credit
    // comes back, so the fold is 100 + 5, not 5.
    let mut feb = movement("p1");
    feb.credit_left = 5.0;
    state
        .save_delivery(&op, date("2026-02-10"), 0.0, vec![feb])
        .unwrap();

    assert_eq!(state.participant("p1").unwrap().balance, 105.0);
    state.verify().unwrap();
}

#[test]
fn test_resave_replacing_floored_repayment_refolds_history() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut jan = movement("p1");
    jan.debt_left = 20.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![jan])
        .unwrap();

    // February repays 50 against a 20 debt; the floor stops at zero.
    let mut feb = movement("p1");
    feb.partial_debt_settled = 50.0;
    state
        .save_delivery(&op, date("2026-02-10"), 0.0, vec![feb])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, 0.0);

    // Withdraw the repayment: the January debt stands again at -20, not
    // -50 (which un-applying the repayment at face value would give).
    state
        .save_delivery(&op, date("2026-02-10"), 0.0, vec![movement("p1")])
        .unwrap();

    assert_eq!(state.participant("p1").unwrap().balance, -20.0);
    state.verify().unwrap();
}

#[test]
fn test_resave_replacing_settle_all_debt_refolds_history() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut jan = movement("p1");
    jan.use_credit = 8.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![jan])
        .unwrap();

    let mut feb = movement("p1");
    feb.settle_all_debt = true;
    state
        .save_delivery(&op, date("2026-02-10"), 0.0, vec![feb])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, 0.0);

    let mut feb = movement("p1");
    feb.credit_left = 3.0;
    state
        .save_delivery(&op, date("2026-02-10"), 0.0, vec![feb])
        .unwrap();

    // The debt clearance is gone: -8 + 3.
    assert_eq!(state.participant("p1").unwrap().balance, -5.0);
    state.verify().unwrap();
}

#[test]
fn test_out_of_order_insert_recomputes_downstream() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut feb = movement("p1");
    feb.use_credit = 10.0;
    state
        .save_delivery(&op, date("2026-02-01"), 0.0, vec![feb])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, -10.0);

    // A forgotten January sheet turns up afterwards.
    let mut jan = movement("p1");
    jan.credit_left = 30.0;
    state
        .save_delivery(&op, date("2026-01-01"), 40.0, vec![jan])
        .unwrap();

    // Fold in date order: +30 then -10.
    assert_eq!(state.participant("p1").unwrap().balance, 20.0);
    assert_eq!(
        state.participant("p1").unwrap().last_modified,
        Some(date("2026-02-01"))
    );

    // January is now the first delivery; its reported drawer is the seed
    // and February's opening figure re-derives from it.
    assert_eq!(state.delivery(&date("2026-01-01")).unwrap().cash_found, 40.0);
    assert_eq!(state.delivery(&date("2026-02-01")).unwrap().cash_found, 40.0);
    state.verify().unwrap();
}

#[test]
fn test_dropping_a_movement_on_resave_recomputes() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m1 = movement("p1");
    m1.credit_left = 5.0;
    let mut m2 = movement("p2");
    m2.debt_left = 3.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m1, m2])
        .unwrap();
    assert_eq!(state.participant("p2").unwrap().balance, -3.0);

    // Re-save without p2's movement: their balance must return to the fold
    // of what remains, i.e. zero, and last_modified must clear.
    let mut m1 = movement("p1");
    m1.credit_left = 5.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m1])
        .unwrap();

    assert_eq!(state.participant("p2").unwrap().balance, 0.0);
    assert_eq!(state.participant("p2").unwrap().last_modified, None);
    state.verify().unwrap();
}

#[test]
fn test_save_validation_errors() {
    let mut state = base_state();
    let op = Actor::member("op");

    let ghost = movement("nobody");
    assert_eq!(
        state.save_delivery(&op, date("2026-01-10"), 0.0, vec![ghost]),
        Err(LedgerError::UnknownParticipant("nobody".to_string()))
    );

    let mut conflicted = movement("p1");
    conflicted.debt_left = 1.0;
    conflicted.credit_left = 1.0;
    assert_eq!(
        state.save_delivery(&op, date("2026-01-10"), 0.0, vec![conflicted]),
        Err(LedgerError::ConflictingMovement {
            participant_id: "p1".to_string()
        })
    );

    let twice = vec![movement("p1"), movement("p1")];
    assert_eq!(
        state.save_delivery(&op, date("2026-01-10"), 0.0, twice),
        Err(LedgerError::DuplicateMovement {
            participant_id: "p1".to_string()
        })
    );

    // Nothing was persisted by the failed saves.
    assert!(state.delivery(&date("2026-01-10")).is_none());
}

// ==========================================
// Deleting deliveries
// ==========================================

#[test]
fn test_delete_middle_delivery_recomputes_and_rechains() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut jan = movement("p1");
    jan.credit_left = 30.0;
    jan.amount_settled = 30.0;
    state
        .save_delivery(&op, date("2026-01-01"), 10.0, vec![jan])
        .unwrap();

    let mut feb = movement("p1");
    feb.use_credit = 10.0;
    feb.amount_settled = 5.0;
    state
        .save_delivery(&op, date("2026-02-01"), 0.0, vec![feb])
        .unwrap();

    let mut mar = movement("p1");
    mar.debt_left = 2.0;
    state
        .save_delivery(&op, date("2026-03-01"), 0.0, vec![mar])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, 18.0);

    state.delete_delivery(&op, &date("2026-02-01")).unwrap();

    // Balance refolds without February: +30 - 2.
    assert_eq!(state.participant("p1").unwrap().balance, 28.0);
    // The chain heals: March now opens with January's closing cash.
    assert_eq!(state.delivery(&date("2026-03-01")).unwrap().cash_found, 40.0);
    state.verify().unwrap();
}

#[test]
fn test_delete_unknown_delivery() {
    let mut state = base_state();
    assert_eq!(
        state.delete_delivery(&Actor::member("op"), &date("2026-01-01")),
        Err(LedgerError::UnknownDelivery(date("2026-01-01")))
    );
}

// ==========================================
// Close / reopen state machine
// ==========================================

#[test]
fn test_closed_delivery_rejects_member_edits() {
    let mut state = base_state();
    let op = Actor::member("op");
    let treasurer = Actor::treasurer("boss");

    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![])
        .unwrap();
    state.close_delivery(&op, &date("2026-01-10")).unwrap();
    assert!(state.delivery(&date("2026-01-10")).unwrap().closed);

    assert_eq!(
        state.save_delivery(&op, date("2026-01-10"), 0.0, vec![]),
        Err(LedgerError::DeliveryClosed {
            date: date("2026-01-10")
        })
    );
    assert_eq!(
        state.delete_delivery(&op, &date("2026-01-10")),
        Err(LedgerError::DeliveryClosed {
            date: date("2026-01-10")
        })
    );

    // The treasurer may still edit it.
    let mut m = movement("p1");
    m.credit_left = 1.0;
    state
        .save_delivery(&treasurer, date("2026-01-10"), 0.0, vec![m])
        .unwrap();
    assert_eq!(state.participant("p1").unwrap().balance, 1.0);
}

#[test]
fn test_reopen_requires_privilege() {
    let mut state = base_state();
    let op = Actor::member("op");
    let treasurer = Actor::treasurer("boss");

    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![])
        .unwrap();
    state.close_delivery(&op, &date("2026-01-10")).unwrap();

    assert_eq!(
        state.reopen_delivery(&op, &date("2026-01-10")),
        Err(LedgerError::PrivilegeRequired)
    );

    state.reopen_delivery(&treasurer, &date("2026-01-10")).unwrap();
    assert!(!state.delivery(&date("2026-01-10")).unwrap().closed);

    // Once reopened, members can edit again.
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![])
        .unwrap();
}

// ==========================================
// Participants
// ==========================================

#[test]
fn test_cannot_remove_last_participant() {
    let mut state = LedgerState::default();
    let op = Actor::member("op");
    state.add_participant(&op, "p1", "Ada").unwrap();

    assert_eq!(
        state.remove_participant(&op, "p1"),
        Err(LedgerError::LastParticipant)
    );
}

#[test]
fn test_remove_participant_cascades_movements() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m1 = movement("p1");
    m1.amount_settled = 10.0;
    m1.credit_left = 10.0;
    let mut m2 = movement("p2");
    m2.amount_settled = 6.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m1, m2])
        .unwrap();
    assert_eq!(state.delivery(&date("2026-01-10")).unwrap().cash_left, 16.0);

    state.remove_participant(&op, "p1").unwrap();

    assert!(state.participant("p1").is_none());
    assert_eq!(state.movements_for(&date("2026-01-10")).len(), 1);
    // Drawer arithmetic re-derives without the removed movements.
    assert_eq!(state.delivery(&date("2026-01-10")).unwrap().cash_left, 6.0);
    state.verify().unwrap();
}

#[test]
fn test_duplicate_participant_rejected() {
    let mut state = base_state();
    assert_eq!(
        state.add_participant(&Actor::member("op"), "p1", "Ada again"),
        Err(LedgerError::DuplicateParticipant("p1".to_string()))
    );
}

// ==========================================
// Queries and audit trail
// ==========================================

#[test]
fn test_display_balances_round_to_tenths() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.credit_left = 12.34;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m])
        .unwrap();

    assert_eq!(state.balances()["p1"], 12.34);
    assert_eq!(state.display_balances()["p1"], 12.3);
}

#[test]
fn test_historical_balances_ignore_the_cache() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut jan = movement("p1");
    jan.credit_left = 30.0;
    state
        .save_delivery(&op, date("2026-01-01"), 0.0, vec![jan])
        .unwrap();
    let mut feb = movement("p1");
    feb.credit_left = 20.0;
    state
        .save_delivery(&op, date("2026-02-01"), 0.0, vec![feb])
        .unwrap();

    assert_eq!(state.historical_balances(&date("2026-01-01"))["p1"], 30.0);
    assert_eq!(state.historical_balances(&date("2026-02-01"))["p1"], 50.0);
    assert_eq!(state.balances()["p1"], 50.0);
}

#[test]
fn test_audit_trail_records_mutations() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.credit_left = 5.0;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m])
        .unwrap();
    state.close_delivery(&op, &date("2026-01-10")).unwrap();

    let log = state.audit_log();
    assert_eq!(log.entries_of_type("participant_added").len(), 2);
    assert_eq!(log.entries_of_type("delivery_saved").len(), 1);
    assert_eq!(log.entries_of_type("delivery_closed").len(), 1);
    assert_eq!(log.entries_of_type("balance_changed").len(), 1);
    assert_eq!(log.entries_for_participant("p1").len(), 1);
}

#[test]
fn test_forced_recompute_is_idempotent() {
    let mut state = base_state();
    let op = Actor::member("op");

    let mut m = movement("p1");
    m.credit_left = 7.5;
    state
        .save_delivery(&op, date("2026-01-10"), 0.0, vec![m])
        .unwrap();

    let before = state.balances();
    state.recompute_and_apply();
    state.recompute_and_apply();
    assert_eq!(state.balances(), before);
    state.verify().unwrap();
}
