//! Domain types: participants, delivery events and settlement movements.

pub mod delivery;
pub mod movement;
pub mod participant;

pub use delivery::Delivery;
pub use movement::Movement;
pub use participant::Participant;
