use std::collections::HashMap;

use tracing::warn;

use crate::{
    EngineError, PlannerOptions, ResultEngine, SettlementBreakdown, SettledStatus, Transfer,
    TripId, TripState, TripStore,
};

mod expenses;
mod installments;
mod participants;
mod settlements;
mod trips;

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Engine configuration passed in by the caller.
///
/// Nothing here is read from ambient storage: the "optimize transfers"
/// preference arrives as [`PlannerOptions::mode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub planner: PlannerOptions,
}

/// A planned transfer annotated for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub transfer: Transfer,
    pub status: SettledStatus,
    pub breakdown: SettlementBreakdown,
}

/// Entry point of the ledger: caches opened trips and writes through `S`.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
    options: EngineOptions,
    trips: HashMap<TripId, TripState>,
}

impl<S: TripStore> Engine<S> {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder<S> {
        EngineBuilder::default()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the in-memory state of an opened trip.
    pub fn trip(&self, trip_id: TripId) -> ResultEngine<&TripState> {
        self.trips
            .get(&trip_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("trip {trip_id} is not open")))
    }

    fn trip_mut(&mut self, trip_id: TripId) -> ResultEngine<&mut TripState> {
        self.trips
            .get_mut(&trip_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("trip {trip_id} is not open")))
    }

    /// Puts back the pre-call snapshot after a failed write.
    fn rollback(&mut self, snapshot: TripState, err: &EngineError) {
        warn!(trip = %snapshot.trip.id, error = %err, "write failed, state rolled back");
        self.trips.insert(snapshot.trip.id, snapshot);
    }
}

/// The builder for `Engine`
pub struct EngineBuilder<S> {
    store: Option<S>,
    options: EngineOptions,
}

impl<S> Default for EngineBuilder<S> {
    fn default() -> Self {
        Self {
            store: None,
            options: EngineOptions::default(),
        }
    }
}

impl<S: TripStore> EngineBuilder<S> {
    /// Pass the required storage collaborator
    pub fn store(mut self, store: S) -> EngineBuilder<S> {
        self.store = Some(store);
        self
    }

    pub fn options(mut self, options: EngineOptions) -> EngineBuilder<S> {
        self.options = options;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine<S>> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Validation("a trip store is required".to_string()))?;
        Ok(Engine {
            store,
            options: self.options,
            trips: HashMap::new(),
        })
    }
}
