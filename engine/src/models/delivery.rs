//! Delivery event ("consegna") model.
//!
//! One delivery per calendar date, at most. Each delivery records the cash
//! drawer at the start of the day (`cash_found`), the aggregate paid out to
//! the supplier, and the closing cash left in the drawer.
//!
//! # Critical Invariants
//!
//! 1. **Chaining**: `cash_found` of delivery *N* equals `cash_left` of the
//!    chronologically preceding delivery. The very first delivery in history
//!    keeps its stored value as the seed (see [`crate::chain`]).
//! 2. **Drawer arithmetic**: `cash_left == cash_found + Σ amount_settled
//!    − Σ amount_to_supplier` over the delivery's own movements. `cash_left`
//!    is written by the save operation, never recomputed at read time.

use crate::core::date::EventDate;
use crate::models::movement::Movement;
use serde::{Deserialize, Serialize};

/// A single delivery event, keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// Calendar date, unique key across history.
    pub date: EventDate,

    /// Cash in the drawer at the start of the delivery (euros).
    /// Derived from the previous delivery's `cash_left`, except for the
    /// first delivery which stores the literal seed.
    pub cash_found: f64,

    /// Aggregate cash paid to the supplier during the delivery (euros).
    pub cash_paid_to_supplier: f64,

    /// Cash left in the drawer when the delivery ends (euros).
    pub cash_left: f64,

    /// Closed deliveries reject edits from non-privileged actors.
    pub closed: bool,
}

impl Delivery {
    /// Create an open delivery with the given opening cash and no takings yet.
    pub fn new(date: EventDate, cash_found: f64) -> Self {
        Self {
            date,
            cash_found,
            cash_paid_to_supplier: 0.0,
            cash_left: cash_found,
            closed: false,
        }
    }

    /// Sum of cash collected from participants during this delivery.
    pub fn collected(movements: &[Movement]) -> f64 {
        movements.iter().map(|m| m.amount_settled).sum()
    }

    /// Sum of the per-movement supplier payments of this delivery.
    pub fn paid_to_supplier(movements: &[Movement]) -> f64 {
        movements.iter().map(|m| m.amount_to_supplier).sum()
    }
}
