//! Cash-Chain Calculator.
//!
//! Derives each delivery's opening cash from its chain position, never from
//! a stored value that may have gone stale. Because the opening figure is
//! always re-derived, the chain self-heals whenever history is edited: fix
//! one day's closing cash and every later opening figure follows.
//!
//! # Critical Invariants
//!
//! - A prior closing cash of exactly `0.0` is a real value and propagates;
//!   only the *absence* of a prior delivery (`None`) falls back to the
//!   event's own stored seed.
//! - [`chain_sequence`] is idempotent: chaining an already-chained list is
//!   a no-op.
//! - Date uniqueness is assumed, not checked. Two deliveries on the same
//!   date are undefined behavior here and must be rejected upstream by the
//!   store.

use crate::core::money::round_to_cents;
use crate::models::Delivery;

/// Derive a delivery's opening cash from the previous delivery's closing
/// cash.
///
/// `previous_closing` carries `Some(x)` when a chronologically earlier
/// delivery exists — including `Some(0.0)`, an empty-but-real drawer — and
/// `None` only for the first delivery in history, whose stored `cash_found`
/// is the seed and is returned verbatim.
///
/// # Example
/// ```
/// use coop_cash_engine::chain::derive_opening_cash;
/// use coop_cash_engine::core::date::EventDate;
/// use coop_cash_engine::models::Delivery;
///
/// let d = Delivery::new(EventDate::new("2026-01-10").unwrap(), 42.0);
/// assert_eq!(derive_opening_cash(&d, Some(0.0)), 0.0); // empty drawer, still chained
/// assert_eq!(derive_opening_cash(&d, None), 42.0);     // first in history: seed
/// ```
pub fn derive_opening_cash(event: &Delivery, previous_closing: Option<f64>) -> f64 {
    match previous_closing {
        Some(closing) => round_to_cents(closing),
        None => event.cash_found,
    }
}

/// A delivery's closing cash.
///
/// Closing cash is written by the save operation, which has the full
/// movement list in hand; readers that only see the event must take the
/// stored field as-is.
pub fn derive_closing_cash(event: &Delivery) -> f64 {
    event.cash_left
}

/// Re-derive opening cash for a whole event list.
///
/// Takes deliveries in reverse-chronological order (the order history is
/// normally loaded for display), reverses to chronological order, threads
/// each closing cash into the next opening cash, and reverses back before
/// returning. Stable for deliveries with no movements and idempotent on
/// already-chained input.
pub fn chain_sequence(events_descending: Vec<Delivery>) -> Vec<Delivery> {
    let mut events = events_descending;
    events.reverse();

    let mut previous_closing: Option<f64> = None;
    for event in events.iter_mut() {
        event.cash_found = derive_opening_cash(event, previous_closing);
        previous_closing = Some(derive_closing_cash(event));
    }

    events.reverse();
    events
}
