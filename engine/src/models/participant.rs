//! Participant (co-op member) model.
//!
//! A participant carries a single running `balance`:
//! - positive = credit the co-op owes them
//! - negative = debt they owe the co-op
//! - zero = settled
//!
//! # Critical Invariant
//!
//! `balance` is a **materialized cache**, never an independently authoritative
//! value. At all times it must equal the fold of every movement affecting the
//! participant across all deliveries in chronological order
//! (see [`crate::ledger::recompute_all_balances`]). Only ledger engine output
//! is ever written into it.

use crate::core::date::EventDate;
use serde::{Deserialize, Serialize};

/// A co-op member with a running credit/debt balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Opaque identifier, unique within the ledger.
    pub id: String,

    /// Name shown on the delivery sheet.
    pub display_name: String,

    /// Running balance in euros, rounded to cents.
    /// Cache of the movement fold; see module docs.
    pub balance: f64,

    /// Date of the most recent movement affecting this participant,
    /// `None` if untouched.
    pub last_modified: Option<EventDate>,
}

impl Participant {
    /// Create a participant with a zero, settled balance.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            balance: 0.0,
            last_modified: None,
        }
    }

    /// Whether the participant currently holds credit.
    pub fn has_credit(&self) -> bool {
        self.balance > 0.0
    }

    /// Whether the participant currently owes a debt.
    pub fn has_debt(&self) -> bool {
        self.balance < 0.0
    }
}
