//! Foundational value types: money rounding and the date contract.

pub mod date;
pub mod money;
