//! Balance Ledger Engine.
//!
//! The canonical rule for moving a participant's balance through one
//! settlement movement, plus the whole-history recomputation required after
//! structural edits (deleting a delivery, inserting one out of order).
//!
//! Everything here is a pure, total function over numbers and lists: no
//! I/O, no hidden state, no failure modes on well-typed input. The calling
//! layer owns transactions, serialization of concurrent writes, and
//! persistence of the results.
//!
//! # Critical Invariants
//!
//! 1. The step order inside [`apply_movement`] is fixed; changing it changes
//!    results.
//! 2. [`recompute_all_balances`] is idempotent and must run after any
//!    deletion of a historical delivery.
//! 3. Results are rounded at the configured granularity before they are
//!    returned, never mid-fold.

use crate::core::date::EventDate;
use crate::core::money::Rounding;
use crate::models::{Delivery, Movement};
use std::collections::{BTreeMap, HashMap};

/// Output of [`recompute_all_balances`] for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputedBalance {
    /// Balance after folding the full movement history, rounded.
    pub balance: f64,

    /// Date of the last movement that touched the participant,
    /// `None` if no movement ever did.
    pub last_modified: Option<EventDate>,
}

/// Transform a balance through one movement.
///
/// The steps run in this exact order — the order is load-bearing:
///
/// 1. `settle_all` resets the balance to zero, discarding prior credit
///    *and* prior debt.
/// 2. `use_credit` is subtracted unconditionally (no bounds check against
///    the credit actually held; preventing over-consumption is a UI-layer
///    concern).
/// 3. Debt repayment, only while the balance is negative: `settle_all_debt`
///    zeroes it; otherwise `partial_debt_settled` climbs toward zero and is
///    floored there — repaying more than the debt never creates credit.
/// 4. `debt_left` is subtracted.
/// 5. `credit_left` is added.
/// 6. The result is rounded at `rounding` granularity.
///
/// Total function: any finite input produces a finite output. A movement
/// with both `debt_left` and `credit_left` set is folded as-is; rejecting
/// that combination is the store's job.
///
/// # Example
/// ```
/// use coop_cash_engine::core::money::Rounding;
/// use coop_cash_engine::ledger::apply_movement;
/// use coop_cash_engine::models::Movement;
///
/// let mut m = Movement::for_participant("p1");
/// m.settle_all = true;
/// m.credit_left = 15.0;
///
/// // settle_all runs before credit_left is added: 100 -> 0 -> 15, not 115.
/// assert_eq!(apply_movement(100.0, &m, Rounding::Cents), 15.0);
/// ```
pub fn apply_movement(balance_before: f64, movement: &Movement, rounding: Rounding) -> f64 {
    let mut balance = balance_before;

    if movement.settle_all {
        balance = 0.0;
    }

    if movement.use_credit > 0.0 {
        balance -= movement.use_credit;
    }

    if movement.settle_all_debt && balance < 0.0 {
        balance = 0.0;
    } else if movement.partial_debt_settled > 0.0 && balance < 0.0 {
        balance = (balance + movement.partial_debt_settled).min(0.0);
    }

    if movement.debt_left > 0.0 {
        balance -= movement.debt_left;
    }

    if movement.credit_left > 0.0 {
        balance += movement.credit_left;
    }

    rounding.apply(balance)
}

/// Recompute every participant's balance from zero across full history.
///
/// Folds [`apply_movement`] over all movements in strict chronological
/// order and records the date of the last movement per participant. The
/// returned map is the new authoritative cache; callers persist it.
///
/// Must be invoked after deleting a historical delivery (the materialized
/// balance of everyone with movements after the deleted date changes) and
/// is safe to invoke unconditionally: re-running on unchanged history
/// yields identical output.
pub fn recompute_all_balances(
    participant_ids: &[String],
    events_chronological: &[Delivery],
    movements_by_date: &BTreeMap<EventDate, Vec<Movement>>,
    rounding: Rounding,
) -> HashMap<String, RecomputedBalance> {
    let mut result: HashMap<String, RecomputedBalance> = participant_ids
        .iter()
        .map(|id| {
            (
                id.clone(),
                RecomputedBalance {
                    balance: 0.0,
                    last_modified: None,
                },
            )
        })
        .collect();

    for event in events_chronological {
        let Some(movements) = movements_by_date.get(&event.date) else {
            continue;
        };
        for movement in movements {
            let Some(entry) = result.get_mut(&movement.participant_id) else {
                continue;
            };
            entry.balance = apply_movement(entry.balance, movement, rounding);
            entry.last_modified = Some(event.date.clone());
        }
    }

    result
}

/// Reconstruct the balance as it stood immediately before a date.
///
/// Used when a delivery at a given date is re-saved and the engine needs
/// "the balance before this day" without replaying full history. Computed
/// as the stored balance minus the summed net effect of every movement at
/// or after the target date:
///
/// ```text
/// balance_before = stored − Σ (credit_left − use_credit
///                              + partial_debt_settled − debt_left)
/// ```
///
/// This is an algebraic shortcut, cheaper than a replay from zero. It
/// relies on the cache invariant (the stored balance already reflects
/// every movement up to now) and on every inverted movement being linear
/// (see [`Movement::is_linear`]): a reset or a floored repayment does not
/// contribute its plain net effect, and un-applying one here reconstructs
/// the wrong balance. Callers must fall back to a full recomputation in
/// that case.
pub fn balance_before_date<'a, I>(
    current_stored_balance: f64,
    movements_on_or_after: I,
    rounding: Rounding,
) -> f64
where
    I: IntoIterator<Item = &'a Movement>,
{
    let net: f64 = movements_on_or_after.into_iter().map(Movement::net_effect).sum();
    rounding.apply(current_stored_balance - net)
}

/// Balance of one participant as of a past date (display-only query).
///
/// Replays [`apply_movement`] from zero across only the movements dated
/// on-or-before `as_of`, in chronological order. O(history) per call and
/// deliberately ignores the stored balance cache — the cache reflects
/// "now", not an arbitrary past date.
pub fn historical_balance_as_of(
    participant_id: &str,
    as_of: &EventDate,
    events_chronological: &[Delivery],
    movements_by_date: &BTreeMap<EventDate, Vec<Movement>>,
    rounding: Rounding,
) -> f64 {
    let mut balance = 0.0;

    for event in events_chronological {
        if event.date > *as_of {
            break;
        }
        let Some(movements) = movements_by_date.get(&event.date) else {
            continue;
        };
        for movement in movements {
            if movement.participant_id == participant_id {
                balance = apply_movement(balance, movement, rounding);
            }
        }
    }

    balance
}
