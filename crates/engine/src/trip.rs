//! The `Trip` is the bounded financial context: its roster of participants
//! and, through [`TripState`], the expenses and settled transfers attached to it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseId, Participant, ParticipantId, ResultEngine, SettledPayments,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub Uuid);

impl TripId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TripId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trip record with its ordered participant roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub participants: Vec<Participant>,
}

impl Trip {
    pub fn new(name: impl Into<String>, participants: Vec<Participant>) -> Self {
        Self {
            id: TripId::new(),
            name: name.into(),
            participants,
        }
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Case-insensitive lookup by display name.
    pub fn participant_by_name(&self, name: &str) -> Option<&Participant> {
        let name = name.trim();
        self.participants
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Display name of `id`, falling back to the raw id for unknown people.
    pub fn display_name(&self, id: ParticipantId) -> String {
        self.participant(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn require_participant(&self, id: ParticipantId) -> ResultEngine<&Participant> {
        self.participant(id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("participant {id}")))
    }

    /// Adds a participant, enforcing a non-empty name unique within the trip.
    pub(crate) fn push_participant(&mut self, mut participant: Participant) -> ResultEngine<()> {
        let name = participant.name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation(
                "participant name must not be empty".to_string(),
            ));
        }
        if self.participant_by_name(name).is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        participant.name = name.to_string();
        self.participants.push(participant);
        Ok(())
    }
}

/// In-memory projection of a trip loaded from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripState {
    pub trip: Trip,
    pub expenses: Vec<Expense>,
    pub settled: SettledPayments,
}

impl TripState {
    pub fn expense(&self, id: ExpenseId) -> ResultEngine<&Expense> {
        self.expenses
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id}")))
    }

    pub(crate) fn expense_mut(&mut self, id: ExpenseId) -> ResultEngine<&mut Expense> {
        self.expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn push_participant_rejects_duplicates_and_blank_names() {
        let mut trip = Trip::new("Rome", vec![Participant::new("Alice", Role::Admin)]);
        assert_eq!(
            trip.push_participant(Participant::external(" alice ")),
            Err(EngineError::ExistingKey("alice".to_string()))
        );
        assert!(matches!(
            trip.push_participant(Participant::external("  ")),
            Err(EngineError::Validation(_))
        ));
        trip.push_participant(Participant::external(" Carla ")).unwrap();
        assert_eq!(trip.participants[1].name, "Carla");
        assert!(trip.participants[1].external);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let trip = Trip::new("Rome", vec![]);
        let ghost = ParticipantId::new();
        assert_eq!(trip.display_name(ghost), ghost.to_string());
    }
}
