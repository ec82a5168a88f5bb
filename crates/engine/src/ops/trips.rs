use tracing::info;

use crate::{Participant, ResultEngine, Trip, TripId, TripState, TripStore};

use super::{Engine, normalize_required_name};

impl<S: TripStore> Engine<S> {
    /// Creates a trip with its initial roster and opens it.
    ///
    /// Names are trimmed and must be unique within the trip (case-insensitive).
    pub async fn create_trip(
        &mut self,
        name: &str,
        members: Vec<Participant>,
    ) -> ResultEngine<TripId> {
        let name = normalize_required_name(name, "trip")?;
        let mut trip = Trip::new(name, Vec::with_capacity(members.len()));
        for member in members {
            trip.push_participant(member)?;
        }

        let trip = self.store.save_trip(&trip).await?;
        let trip_id = trip.id;
        info!(trip = %trip_id, members = trip.participants.len(), "trip created");
        self.trips.insert(
            trip_id,
            TripState {
                trip,
                expenses: Vec::new(),
                settled: Default::default(),
            },
        );
        Ok(trip_id)
    }

    /// Loads a trip, its expenses and its settled set from storage.
    ///
    /// Re-opening an already opened trip refreshes the cached projection.
    pub async fn open_trip(&mut self, trip_id: TripId) -> ResultEngine<&TripState> {
        let trip = self.store.load_trip(trip_id).await?;
        let expenses = self.store.list_expenses(trip_id).await?;
        let settled = self.store.load_settled(trip_id).await?;
        info!(
            trip = %trip_id,
            expenses = expenses.len(),
            settled = settled.len(),
            "trip opened"
        );
        self.trips.insert(
            trip_id,
            TripState {
                trip,
                expenses,
                settled,
            },
        );
        self.trip(trip_id)
    }

    /// Drops the cached projection of a trip.
    pub fn close_trip(&mut self, trip_id: TripId) -> bool {
        self.trips.remove(&trip_id).is_some()
    }
}
