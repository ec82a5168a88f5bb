use tracing::{info, warn};

use crate::{
    EngineError, Expense, Participant, ParticipantId, ResultEngine, TripId, TripStore,
};

use super::{Engine, normalize_required_name};

impl<S: TripStore> Engine<S> {
    /// Adds a person who is not a registered user to the trip roster.
    pub async fn add_external_participant(
        &mut self,
        trip_id: TripId,
        name: &str,
    ) -> ResultEngine<ParticipantId> {
        let name = normalize_required_name(name, "participant")?;
        let participant = Participant::external(name);
        let participant_id = participant.id;

        let state = self.trip_mut(trip_id)?;
        let snapshot = state.clone();
        state.trip.push_participant(participant)?;
        let trip = state.trip.clone();

        match self.store.save_trip(&trip).await {
            Ok(stored) => {
                self.trip_mut(trip_id)?.trip = stored;
                info!(trip = %trip_id, participant = %participant_id, "external participant added");
                Ok(participant_id)
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Removes a participant who pays or shares no expense and appears in no
    /// settled transfer.
    pub async fn remove_participant(
        &mut self,
        trip_id: TripId,
        participant_id: ParticipantId,
    ) -> ResultEngine<()> {
        let state = self.trip_mut(trip_id)?;
        let name = state.trip.require_participant(participant_id)?.name.clone();
        if state.expenses.iter().any(|e| e.involves(participant_id)) {
            return Err(EngineError::ParticipantInUse(format!(
                "{name} is referenced by expenses"
            )));
        }
        if state.settled.involves(participant_id) {
            return Err(EngineError::ParticipantInUse(format!(
                "{name} is referenced by settled transfers"
            )));
        }

        let snapshot = state.clone();
        state.trip.participants.retain(|p| p.id != participant_id);
        let trip = state.trip.clone();

        match self.store.save_trip(&trip).await {
            Ok(stored) => {
                self.trip_mut(trip_id)?.trip = stored;
                info!(trip = %trip_id, participant = %participant_id, "participant removed");
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Folds participant `from` into `into`: every expense paid or shared by
    /// `from` is rewritten to `into`, then `from` leaves the roster.
    ///
    /// When both were in the same sharing group, the group shrinks by one.
    /// Returns how many expenses were rewritten.
    pub async fn merge_participant(
        &mut self,
        trip_id: TripId,
        from: ParticipantId,
        into: ParticipantId,
    ) -> ResultEngine<usize> {
        if from == into {
            return Err(EngineError::Validation(
                "cannot merge a participant into itself".to_string(),
            ));
        }
        let state = self.trip_mut(trip_id)?;
        state.trip.require_participant(from)?;
        state.trip.require_participant(into)?;
        if state.settled.involves(from) {
            return Err(EngineError::ParticipantInUse(format!(
                "{} is referenced by settled transfers",
                state.trip.display_name(from)
            )));
        }

        let snapshot = state.clone();
        let mut rewritten: Vec<Expense> = Vec::new();
        for expense in state.expenses.iter_mut().filter(|e| e.involves(from)) {
            if expense.payer == from {
                expense.payer = into;
            }
            let already_sharing = expense.participants.contains(&into);
            if already_sharing {
                expense.participants.retain(|p| *p != from);
            } else {
                for participant in expense.participants.iter_mut() {
                    if *participant == from {
                        *participant = into;
                    }
                }
            }
            rewritten.push(expense.clone());
        }
        state.trip.participants.retain(|p| p.id != from);
        let trip = state.trip.clone();

        let mut persisted: Vec<Expense> = Vec::new();
        let mut failure = None;
        for expense in &rewritten {
            match self.store.update_expense(expense).await {
                Ok(stored) => persisted.push(stored),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if failure.is_none()
            && let Err(err) = self.store.save_trip(&trip).await
        {
            failure = Some(err);
        }

        if let Some(err) = failure {
            // Undo the expense writes that already went through.
            for stored in &persisted {
                if let Ok(original) = snapshot.expense(stored.id)
                    && let Err(undo) = self.store.update_expense(original).await
                {
                    warn!(expense = %original.id, error = %undo, "could not restore expense");
                }
            }
            self.rollback(snapshot, &err);
            return Err(err);
        }

        let state = self.trip_mut(trip_id)?;
        for stored in persisted {
            if let Ok(expense) = state.expense_mut(stored.id) {
                *expense = stored;
            }
        }
        info!(
            trip = %trip_id,
            from = %from,
            into = %into,
            expenses = rewritten.len(),
            "participants merged"
        );
        Ok(rewritten.len())
    }
}
