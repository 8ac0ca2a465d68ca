//! Money rounding rules.
//!
//! All money values are plain `f64` euros. Chained additions over f64 drift,
//! so every value is rounded at each write boundary; reads never re-round an
//! already-stored value.
//!
//! Two granularities exist in this system and they are deliberately kept as
//! distinct, named configuration values:
//! - **Cents** — the authoritative ledger granularity. Everything the store
//!   persists is rounded to the nearest cent.
//! - **Tenths** — the member-facing display granularity (balances shown on
//!   the delivery sheet are rounded to the nearest 0.1 euro).

use serde::{Deserialize, Serialize};

/// Rounding granularity for money values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Nearest 0.01 — authoritative ledger values.
    Cents,
    /// Nearest 0.1 — display-facing balances.
    Tenths,
}

impl Rounding {
    /// Round a value at this granularity.
    ///
    /// # Example
    /// ```
    /// use coop_cash_engine::core::money::Rounding;
    ///
    /// assert_eq!(Rounding::Cents.apply(1.006), 1.01);
    /// assert_eq!(Rounding::Tenths.apply(1.06), 1.1);
    /// ```
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::Cents => round_to_cents(value),
            Rounding::Tenths => round_to_tenths(value),
        }
    }
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding::Cents
    }
}

/// Round to the nearest cent: `round(x * 100) / 100`.
///
/// # Example
/// ```
/// use coop_cash_engine::core::money::round_to_cents;
///
/// assert_eq!(round_to_cents(0.1 + 0.2), 0.3);
/// assert_eq!(round_to_cents(1.006), 1.01);
/// ```
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to the nearest tenth of a euro: `round(x * 10) / 10`.
pub fn round_to_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
