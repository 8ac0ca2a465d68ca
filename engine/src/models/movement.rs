//! Settlement movement model.
//!
//! A movement is one participant's settlement action within one delivery:
//! cash handed over, prior credit consumed, new debt or credit created.
//! There is at most one movement per (delivery date, participant) pair, and
//! a movement lives and dies with its parent delivery.
//!
//! The fields are independent flags/amounts that combine through the fixed
//! fold rule in [`crate::ledger::apply_movement`]; the movement itself
//! carries no behavior beyond its net-effect sum. Missing or unparseable
//! amounts are the caller's problem and arrive here already coerced to zero.

use serde::{Deserialize, Serialize};

/// One participant's settlement action within one delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Participant this movement belongs to.
    pub participant_id: String,

    /// Wipe the running balance to zero before anything else is applied.
    pub settle_all: bool,

    /// Cash the participant paid into the drawer today (euros).
    /// Affects the drawer arithmetic, not the running balance.
    pub amount_settled: f64,

    /// Prior credit consumed today (euros). Subtracted unconditionally;
    /// the engine does not bounds-check against the credit actually held.
    pub use_credit: f64,

    /// New debt created today (euros). Mutually exclusive with
    /// `credit_left` — enforced by the store, not by the fold rule.
    pub debt_left: f64,

    /// New credit created today (euros).
    pub credit_left: f64,

    /// Repay the entire outstanding debt, if any.
    pub settle_all_debt: bool,

    /// Partial debt repayment (euros). Can only climb back to exactly zero,
    /// never past it.
    pub partial_debt_settled: f64,

    /// Share of today's supplier payment attributed to this movement (euros).
    pub amount_to_supplier: f64,

    /// Free-text note from the delivery sheet.
    pub note: Option<String>,
}

impl Movement {
    /// An empty movement (all flags off, all amounts zero) for a participant.
    pub fn for_participant(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            settle_all: false,
            amount_settled: 0.0,
            use_credit: 0.0,
            debt_left: 0.0,
            credit_left: 0.0,
            settle_all_debt: false,
            partial_debt_settled: 0.0,
            amount_to_supplier: 0.0,
            note: None,
        }
    }

    /// Signed net effect on the running balance, used by the algebraic
    /// shortcut in [`crate::ledger::balance_before_date`]:
    /// `credit_left − use_credit + partial_debt_settled − debt_left`.
    pub fn net_effect(&self) -> f64 {
        self.credit_left - self.use_credit + self.partial_debt_settled - self.debt_left
    }

    /// A movement may not create debt and credit at the same time.
    /// Validation lives in the store; the fold rule itself accepts anything.
    pub fn has_conflicting_flags(&self) -> bool {
        self.debt_left > 0.0 && self.credit_left > 0.0
    }

    /// Whether folding this movement is guaranteed to equal adding its
    /// [`net_effect`](Self::net_effect) to the running balance.
    ///
    /// `settle_all` discards the prior balance, `settle_all_debt` zeroes a
    /// negative one, and `partial_debt_settled` is floored at zero — all
    /// three make the fold depend on the balance the movement was applied
    /// to. Only linear movements can be algebraically un-applied from a
    /// stored balance.
    pub fn is_linear(&self) -> bool {
        !self.settle_all && !self.settle_all_debt && self.partial_debt_settled == 0.0
    }
}
