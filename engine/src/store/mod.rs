//! In-memory ledger state and its mutation operations.
//!
//! [`LedgerState`] owns the consistent snapshot the engine folds over:
//! participants, deliveries keyed by date, and movements keyed by
//! (date, participant). Every mutating operation here plays the role the
//! surrounding persistence layer plays in production — it reads current
//! state, runs the pure chain/ledger computations, and writes the results
//! back as one unit. Callers wrap each operation in a transaction and
//! serialize writes per delivery date; the state itself is single-threaded
//! and synchronous.
//!
//! # Critical Invariants
//!
//! 1. **Materialized fold**: every participant's cached balance equals the
//!    fold of their movements in date order, after every mutation path.
//! 2. **Chained drawer**: `cash_found` of each delivery equals the previous
//!    delivery's `cash_left`; the first delivery keeps its seed.
//! 3. **Uniqueness**: one delivery per date, one movement per
//!    (date, participant).
//! 4. Deleting a delivery, inserting one out of chronological order,
//!    dropping a movement, or replacing a non-linear one forces a full
//!    recomputation; only in-order re-saves of linear movements take the
//!    cheap incremental path.

pub mod checkpoint;

use crate::chain::derive_opening_cash;
use crate::core::date::{DateError, EventDate};
use crate::core::money::Rounding;
use crate::events::{AuditEvent, EventLog};
use crate::ledger::{
    apply_movement, balance_before_date, historical_balance_as_of, recompute_all_balances,
};
use crate::models::{Delivery, Movement, Participant};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Rounding configuration for the ledger.
///
/// The authoritative granularity and the display granularity genuinely
/// differ in this system (cents on the books, tenths on the sheet members
/// see); they are kept as two named values rather than one constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Granularity of every persisted money value.
    pub ledger_rounding: Rounding,

    /// Granularity of member-facing balances.
    pub display_rounding: Rounding,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_rounding: Rounding::Cents,
            display_rounding: Rounding::Tenths,
        }
    }
}

/// The person performing an operation.
///
/// The engine models exactly one privilege distinction: ordinary members
/// may record and close deliveries, privileged actors (the treasurer) may
/// additionally edit closed deliveries and reopen them. Authentication is
/// the caller's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub privileged: bool,
}

impl Actor {
    /// An ordinary co-op member.
    pub fn member(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            privileged: false,
        }
    }

    /// A privileged actor (treasurer).
    pub fn treasurer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            privileged: true,
        }
    }
}

/// Errors surfaced by ledger state operations.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("no delivery exists on {0}")]
    UnknownDelivery(EventDate),

    #[error("participant '{0}' does not exist")]
    UnknownParticipant(String),

    #[error("participant '{0}' already exists")]
    DuplicateParticipant(String),

    #[error("delivery on {date} is closed; only a privileged actor may modify it")]
    DeliveryClosed { date: EventDate },

    #[error("reopening a delivery requires a privileged actor")]
    PrivilegeRequired,

    #[error("movement for participant '{participant_id}' sets both debt_left and credit_left")]
    ConflictingMovement { participant_id: String },

    #[error("duplicate movement for participant '{participant_id}' within one delivery")]
    DuplicateMovement { participant_id: String },

    #[error("cannot remove the last remaining participant")]
    LastParticipant,

    #[error(transparent)]
    InvalidDate(#[from] DateError),

    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Complete ledger state: participants, deliveries, movements, audit log.
#[derive(Debug, Clone)]
pub struct LedgerState {
    config: LedgerConfig,

    /// Participants indexed by id. BTreeMap keeps iteration deterministic.
    participants: BTreeMap<String, Participant>,

    /// Deliveries indexed by date; BTreeMap order *is* chronological order
    /// (the lexical date contract).
    deliveries: BTreeMap<EventDate, Delivery>,

    /// Movements per delivery date, at most one per participant.
    movements: BTreeMap<EventDate, Vec<Movement>>,

    /// Audit trail of every successful mutation.
    log: EventLog,
}

impl LedgerState {
    /// Create an empty ledger with the given rounding configuration.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            participants: BTreeMap::new(),
            deliveries: BTreeMap::new(),
            movements: BTreeMap::new(),
            log: EventLog::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The audit trail.
    pub fn audit_log(&self) -> &EventLog {
        &self.log
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// All participants, ordered by id.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn delivery(&self, date: &EventDate) -> Option<&Delivery> {
        self.deliveries.get(date)
    }

    /// All deliveries in chronological order.
    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.values()
    }

    /// Movements recorded for one delivery date.
    pub fn movements_for(&self, date: &EventDate) -> &[Movement] {
        self.movements.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    /// Add a participant with a zero balance.
    pub fn add_participant(
        &mut self,
        actor: &Actor,
        id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), LedgerError> {
        let id = id.into();
        if self.participants.contains_key(&id) {
            return Err(LedgerError::DuplicateParticipant(id));
        }
        self.participants
            .insert(id.clone(), Participant::new(id.clone(), display_name));
        self.log.log(AuditEvent::ParticipantAdded {
            actor_id: actor.id.clone(),
            participant_id: id,
        });
        Ok(())
    }

    /// Remove a participant, cascading their movements away.
    ///
    /// Dropping movements changes drawer sums and every downstream balance,
    /// so the chain is re-derived and balances are fully recomputed. The
    /// last remaining participant cannot be removed.
    pub fn remove_participant(&mut self, actor: &Actor, id: &str) -> Result<(), LedgerError> {
        if !self.participants.contains_key(id) {
            return Err(LedgerError::UnknownParticipant(id.to_string()));
        }
        if self.participants.len() == 1 {
            return Err(LedgerError::LastParticipant);
        }

        self.participants.remove(id);
        for movements in self.movements.values_mut() {
            movements.retain(|m| m.participant_id != id);
        }

        self.rechain();
        self.recompute_and_apply();
        self.log.log(AuditEvent::ParticipantRemoved {
            actor_id: actor.id.clone(),
            participant_id: id.to_string(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deliveries
    // ------------------------------------------------------------------

    /// Create or re-save the delivery at `date` together with its movements,
    /// as one atomic update.
    ///
    /// `cash_found_reported` is the drawer count reported by the operator;
    /// it only survives as stored if this is the first delivery in history
    /// (the chain seed) — otherwise the chain derives the opening figure.
    /// The aggregate supplier payment and the closing cash are computed from
    /// the movement list, never taken from the caller.
    ///
    /// Re-saving the latest delivery takes the incremental balance path
    /// (reconstruct balance-before-date, apply the new movement). Inserting
    /// a date out of chronological order, dropping a participant's movement
    /// on re-save, or replacing a movement whose fold effect depends on the
    /// prior balance (`settle_all`, `settle_all_debt`, a partial repayment)
    /// is a structural edit and triggers the full recomputation instead.
    pub fn save_delivery(
        &mut self,
        actor: &Actor,
        date: EventDate,
        cash_found_reported: f64,
        movements: Vec<Movement>,
    ) -> Result<(), LedgerError> {
        if let Some(existing) = self.deliveries.get(&date) {
            if existing.closed && !actor.privileged {
                return Err(LedgerError::DeliveryClosed { date });
            }
        }

        // Validate the batch before touching any state.
        let mut seen: HashSet<&str> = HashSet::new();
        for movement in &movements {
            if !self.participants.contains_key(&movement.participant_id) {
                return Err(LedgerError::UnknownParticipant(
                    movement.participant_id.clone(),
                ));
            }
            if movement.has_conflicting_flags() {
                return Err(LedgerError::ConflictingMovement {
                    participant_id: movement.participant_id.clone(),
                });
            }
            if !seen.insert(movement.participant_id.as_str()) {
                return Err(LedgerError::DuplicateMovement {
                    participant_id: movement.participant_id.clone(),
                });
            }
        }

        let rounding = self.config.ledger_rounding;
        let is_latest = self
            .deliveries
            .keys()
            .next_back()
            .map(|last| *last <= date)
            .unwrap_or(true);

        let old_movements = self.movements.get(&date).cloned().unwrap_or_default();
        let new_ids: HashSet<&str> = movements.iter().map(|m| m.participant_id.as_str()).collect();
        let dropped_movement = old_movements
            .iter()
            .any(|m| !new_ids.contains(m.participant_id.as_str()));

        // A replaced movement with a reset or a floored repayment cannot be
        // algebraically un-applied from the cache; only linear old movements
        // keep the shortcut equivalent to a replay.
        let replaced_nonlinear = old_movements.iter().any(|m| !m.is_linear());

        let incremental = is_latest && !dropped_movement && !replaced_nonlinear;
        if incremental {
            // Balance as it stood before this date, then the new movement.
            // With no later deliveries, the only movement on-or-after `date`
            // is the one being replaced.
            for movement in &movements {
                let old_at_date = old_movements
                    .iter()
                    .find(|m| m.participant_id == movement.participant_id);
                let participant = self
                    .participants
                    .get_mut(&movement.participant_id)
                    .expect("validated above");

                let before = balance_before_date(participant.balance, old_at_date, rounding);
                let after = apply_movement(before, movement, rounding);
                if after != participant.balance {
                    self.log.log(AuditEvent::BalanceChanged {
                        participant_id: participant.id.clone(),
                        date: date.clone(),
                        balance_before: participant.balance,
                        balance_after: after,
                    });
                }
                participant.balance = after;
                participant.last_modified = Some(date.clone());
            }
        }

        // Upsert the event and its movements, then re-derive the chain.
        let movement_count = movements.len();
        match self.deliveries.get_mut(&date) {
            Some(existing) => existing.cash_found = cash_found_reported,
            None => {
                self.deliveries
                    .insert(date.clone(), Delivery::new(date.clone(), cash_found_reported));
            }
        }
        self.movements.insert(date.clone(), movements);
        self.rechain();

        if !incremental {
            self.recompute_and_apply();
        }

        let cash_left = self.deliveries[&date].cash_left;
        self.log.log(AuditEvent::DeliverySaved {
            actor_id: actor.id.clone(),
            date,
            movement_count,
            cash_left,
        });
        Ok(())
    }

    /// Delete the delivery at `date` and all its movements.
    ///
    /// Removing a middle event changes every balance computed after it, so
    /// the full recomputation always runs here.
    pub fn delete_delivery(&mut self, actor: &Actor, date: &EventDate) -> Result<(), LedgerError> {
        let delivery = self
            .deliveries
            .get(date)
            .ok_or_else(|| LedgerError::UnknownDelivery(date.clone()))?;
        if delivery.closed && !actor.privileged {
            return Err(LedgerError::DeliveryClosed { date: date.clone() });
        }

        self.deliveries.remove(date);
        self.movements.remove(date);
        self.rechain();
        self.recompute_and_apply();

        self.log.log(AuditEvent::DeliveryDeleted {
            actor_id: actor.id.clone(),
            date: date.clone(),
        });
        Ok(())
    }

    /// Close the delivery at `date` to further edits. Any actor may close.
    pub fn close_delivery(&mut self, actor: &Actor, date: &EventDate) -> Result<(), LedgerError> {
        let delivery = self
            .deliveries
            .get_mut(date)
            .ok_or_else(|| LedgerError::UnknownDelivery(date.clone()))?;
        delivery.closed = true;
        self.log.log(AuditEvent::DeliveryClosed {
            actor_id: actor.id.clone(),
            date: date.clone(),
        });
        Ok(())
    }

    /// Reopen a closed delivery. Privileged actors only.
    pub fn reopen_delivery(&mut self, actor: &Actor, date: &EventDate) -> Result<(), LedgerError> {
        if !actor.privileged {
            return Err(LedgerError::PrivilegeRequired);
        }
        let delivery = self
            .deliveries
            .get_mut(date)
            .ok_or_else(|| LedgerError::UnknownDelivery(date.clone()))?;
        delivery.closed = false;
        self.log.log(AuditEvent::DeliveryReopened {
            actor_id: actor.id.clone(),
            date: date.clone(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current balances at ledger granularity, keyed by participant id.
    pub fn balances(&self) -> BTreeMap<String, f64> {
        self.participants
            .iter()
            .map(|(id, p)| (id.clone(), p.balance))
            .collect()
    }

    /// Current balances rounded at the display granularity.
    pub fn display_balances(&self) -> BTreeMap<String, f64> {
        self.participants
            .iter()
            .map(|(id, p)| (id.clone(), self.config.display_rounding.apply(p.balance)))
            .collect()
    }

    /// Balances as they stood at the end of `as_of`, replayed from zero.
    pub fn historical_balances(&self, as_of: &EventDate) -> BTreeMap<String, f64> {
        let events: Vec<Delivery> = self.deliveries.values().cloned().collect();
        self.participants
            .keys()
            .map(|id| {
                let balance = historical_balance_as_of(
                    id,
                    as_of,
                    &events,
                    &self.movements,
                    self.config.ledger_rounding,
                );
                (id.clone(), balance)
            })
            .collect()
    }

    /// Run the full recomputation and install its output as the new cache.
    ///
    /// Public so operators can force a reconciliation at any time; the
    /// operation is idempotent.
    pub fn recompute_and_apply(&mut self) {
        let ids: Vec<String> = self.participants.keys().cloned().collect();
        let events: Vec<Delivery> = self.deliveries.values().cloned().collect();
        let recomputed = recompute_all_balances(
            &ids,
            &events,
            &self.movements,
            self.config.ledger_rounding,
        );

        for (id, outcome) in recomputed {
            if let Some(participant) = self.participants.get_mut(&id) {
                participant.balance = outcome.balance;
                participant.last_modified = outcome.last_modified;
            }
        }
        self.log.log(AuditEvent::BalancesRecomputed {
            participant_count: self.participants.len(),
        });
    }

    /// Check the two structural invariants: cached balances equal the fold,
    /// and the cash chain is well-formed.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let ids: Vec<String> = self.participants.keys().cloned().collect();
        let events: Vec<Delivery> = self.deliveries.values().cloned().collect();
        let folded = recompute_all_balances(
            &ids,
            &events,
            &self.movements,
            self.config.ledger_rounding,
        );
        for (id, outcome) in &folded {
            let cached = &self.participants[id];
            if (cached.balance - outcome.balance).abs() > 1e-9 {
                return Err(LedgerError::InvariantViolation(format!(
                    "balance cache for '{}' is {} but the fold gives {}",
                    id, cached.balance, outcome.balance
                )));
            }
        }

        let mut previous_closing: Option<f64> = None;
        for event in self.deliveries.values() {
            if let Some(closing) = previous_closing {
                if (event.cash_found - closing).abs() > 1e-9 {
                    return Err(LedgerError::InvariantViolation(format!(
                        "cash_found on {} is {} but the previous delivery closed at {}",
                        event.date, event.cash_found, closing
                    )));
                }
            }
            let movements = self.movements_for(&event.date);
            let expected_left = self.config.ledger_rounding.apply(
                event.cash_found + Delivery::collected(movements)
                    - Delivery::paid_to_supplier(movements),
            );
            if (event.cash_left - expected_left).abs() > 1e-9 {
                return Err(LedgerError::InvariantViolation(format!(
                    "cash_left on {} is {} but the drawer arithmetic gives {}",
                    event.date, event.cash_left, expected_left
                )));
            }
            previous_closing = Some(event.cash_left);
        }

        Ok(())
    }

    /// Re-derive the cash chain and the drawer arithmetic for every
    /// delivery, in chronological order. The first delivery keeps its
    /// stored `cash_found` as the seed.
    fn rechain(&mut self) {
        let rounding = self.config.ledger_rounding;
        let mut previous_closing: Option<f64> = None;

        let dates: Vec<EventDate> = self.deliveries.keys().cloned().collect();
        for date in dates {
            let movements = self.movements.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let collected = Delivery::collected(movements);
            let paid = Delivery::paid_to_supplier(movements);

            let delivery = self.deliveries.get_mut(&date).expect("date came from the map");
            delivery.cash_found = derive_opening_cash(delivery, previous_closing);
            delivery.cash_paid_to_supplier = rounding.apply(paid);
            delivery.cash_left = rounding.apply(delivery.cash_found + collected - paid);
            previous_closing = Some(delivery.cash_left);
        }
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
