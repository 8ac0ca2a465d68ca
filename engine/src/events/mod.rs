//! Audit event logging for ledger mutations.
//!
//! Every mutating operation on the ledger state appends an event here.
//! The log enables:
//! - Auditing (who changed which delivery, and what moved)
//! - Debugging (reconstruct the order of mutations)
//! - Display (the activity feed shown to operators)
//!
//! The engine carries no logging facade; structured audit events *are* its
//! observability surface. The surrounding layer decides whether to persist,
//! print or discard them.

use crate::core::date::EventDate;
use uuid::Uuid;

/// A ledger mutation, captured after it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    /// A delivery was created or re-saved with its movements.
    DeliverySaved {
        actor_id: String,
        date: EventDate,
        movement_count: usize,
        cash_left: f64,
    },

    /// A delivery and its movements were deleted; balances were recomputed.
    DeliveryDeleted {
        actor_id: String,
        date: EventDate,
    },

    /// A delivery was closed to further edits.
    DeliveryClosed {
        actor_id: String,
        date: EventDate,
    },

    /// A closed delivery was reopened by a privileged actor.
    DeliveryReopened {
        actor_id: String,
        date: EventDate,
    },

    /// A participant's cached balance changed.
    BalanceChanged {
        participant_id: String,
        date: EventDate,
        balance_before: f64,
        balance_after: f64,
    },

    /// Full-history recomputation ran over every participant.
    BalancesRecomputed {
        participant_count: usize,
    },

    /// A participant joined the ledger.
    ParticipantAdded {
        actor_id: String,
        participant_id: String,
    },

    /// A participant was removed; their movements were cascaded away.
    ParticipantRemoved {
        actor_id: String,
        participant_id: String,
    },
}

impl AuditEvent {
    /// Short type tag, for filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::DeliverySaved { .. } => "delivery_saved",
            AuditEvent::DeliveryDeleted { .. } => "delivery_deleted",
            AuditEvent::DeliveryClosed { .. } => "delivery_closed",
            AuditEvent::DeliveryReopened { .. } => "delivery_reopened",
            AuditEvent::BalanceChanged { .. } => "balance_changed",
            AuditEvent::BalancesRecomputed { .. } => "balances_recomputed",
            AuditEvent::ParticipantAdded { .. } => "participant_added",
            AuditEvent::ParticipantRemoved { .. } => "participant_removed",
        }
    }

    /// Delivery date the event refers to, if any.
    pub fn date(&self) -> Option<&EventDate> {
        match self {
            AuditEvent::DeliverySaved { date, .. }
            | AuditEvent::DeliveryDeleted { date, .. }
            | AuditEvent::DeliveryClosed { date, .. }
            | AuditEvent::DeliveryReopened { date, .. }
            | AuditEvent::BalanceChanged { date, .. } => Some(date),
            _ => None,
        }
    }

    /// Participant the event refers to, if any.
    pub fn participant_id(&self) -> Option<&str> {
        match self {
            AuditEvent::BalanceChanged { participant_id, .. }
            | AuditEvent::ParticipantAdded { participant_id, .. }
            | AuditEvent::ParticipantRemoved { participant_id, .. } => Some(participant_id),
            _ => None,
        }
    }
}

/// An audit event with its assigned id, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub event: AuditEvent,
}

/// Append-only log of audit entries.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<AuditEntry>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning it a fresh id.
    pub fn log(&mut self, event: AuditEvent) {
        self.entries.push(AuditEntry {
            id: Uuid::new_v4(),
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries with a given type tag.
    pub fn entries_of_type(&self, event_type: &str) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.event.event_type() == event_type)
            .collect()
    }

    /// Entries touching a given delivery date.
    pub fn entries_for_date(&self, date: &EventDate) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.event.date() == Some(date))
            .collect()
    }

    /// Entries touching a given participant.
    pub fn entries_for_participant(&self, participant_id: &str) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.event.participant_id() == Some(participant_id))
            .collect()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
