//! Co-op Cash Ledger - Core Engine
//!
//! Balance reconciliation and cash-drawer chaining for a recurring group
//! purchase (a food co-op). Each delivery event records the cash found in
//! the drawer, the amount paid to the supplier, the cash left over, and the
//! per-participant settlement movements; this crate computes every derived
//! figure.
//!
//! # Architecture
//!
//! - **core**: money rounding and the `YYYY-MM-DD` date contract
//! - **models**: domain types (Participant, Delivery, Movement)
//! - **chain**: Cash-Chain Calculator (opening cash derived from chain
//!   position)
//! - **ledger**: Balance Ledger Engine (the movement fold, full
//!   recomputation, point-in-time reconstruction)
//! - **store**: in-memory ledger state, save/delete/close orchestration,
//!   snapshots
//! - **events**: audit event log
//!
//! # Critical Invariants
//!
//! 1. A participant's cached balance always equals the fold of their
//!    movements in chronological order
//! 2. Each delivery's opening cash equals the previous delivery's closing
//!    cash (the first keeps its seed)
//! 3. All money values are f64 euros, rounded at every write boundary
//! 4. Dates order lexically; `YYYY-MM-DD` strings are never parsed into
//!    calendar types

pub mod chain;
pub mod core;
pub mod events;
pub mod ledger;
pub mod models;
pub mod store;

// Re-exports for convenience
pub use chain::{chain_sequence, derive_closing_cash, derive_opening_cash};
pub use self::core::date::{DateError, EventDate};
pub use self::core::money::{round_to_cents, round_to_tenths, Rounding};
pub use events::{AuditEntry, AuditEvent, EventLog};
pub use ledger::{
    apply_movement, balance_before_date, historical_balance_as_of, recompute_all_balances,
    RecomputedBalance,
};
pub use models::{Delivery, Movement, Participant};
pub use store::{checkpoint::StateSnapshot, Actor, LedgerConfig, LedgerError, LedgerState};
