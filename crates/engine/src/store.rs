//! Storage port.
//!
//! The engine never persists anything itself: trips, expenses and the
//! settled-transfer set go through a [`TripStore`]. Writes return the
//! authoritative post-write state; a failed write surfaces as
//! [`EngineError::Storage`] and the engine rolls its in-memory projection back.
//!
//! [`MemoryStore`] keeps everything in process and can be told to fail writes,
//! which is how rollback paths are exercised.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{EngineError, Expense, ExpenseId, ResultEngine, SettledPayments, Trip, TripId};

/// Persistence collaborator for trip data.
pub trait TripStore: Send + Sync {
    fn load_trip(&self, trip_id: TripId) -> impl Future<Output = ResultEngine<Trip>> + Send;

    fn save_trip(&self, trip: &Trip) -> impl Future<Output = ResultEngine<Trip>> + Send;

    fn list_expenses(
        &self,
        trip_id: TripId,
    ) -> impl Future<Output = ResultEngine<Vec<Expense>>> + Send;

    fn create_expense(
        &self,
        expense: &Expense,
    ) -> impl Future<Output = ResultEngine<Expense>> + Send;

    fn update_expense(
        &self,
        expense: &Expense,
    ) -> impl Future<Output = ResultEngine<Expense>> + Send;

    fn delete_expense(
        &self,
        trip_id: TripId,
        expense_id: ExpenseId,
    ) -> impl Future<Output = ResultEngine<()>> + Send;

    fn load_settled(
        &self,
        trip_id: TripId,
    ) -> impl Future<Output = ResultEngine<SettledPayments>> + Send;

    fn save_settled(
        &self,
        trip_id: TripId,
        settled: &SettledPayments,
    ) -> impl Future<Output = ResultEngine<()>> + Send;
}

#[derive(Debug, Default)]
struct MemoryData {
    trips: HashMap<TripId, Trip>,
    expenses: HashMap<TripId, Vec<Expense>>,
    settled: HashMap<TripId, SettledPayments>,
}

/// In-process [`TripStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`EngineError::Storage`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn data(&self) -> ResultEngine<MutexGuard<'_, MemoryData>> {
        self.data
            .lock()
            .map_err(|_| EngineError::Storage("memory store poisoned".to_string()))
    }

    fn writable(&self) -> ResultEngine<MutexGuard<'_, MemoryData>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Storage("write rejected".to_string()));
        }
        self.data()
    }
}

impl TripStore for MemoryStore {
    async fn load_trip(&self, trip_id: TripId) -> ResultEngine<Trip> {
        self.data()?
            .trips
            .get(&trip_id)
            .cloned()
            .ok_or_else(|| EngineError::KeyNotFound(format!("trip {trip_id}")))
    }

    async fn save_trip(&self, trip: &Trip) -> ResultEngine<Trip> {
        self.writable()?.trips.insert(trip.id, trip.clone());
        Ok(trip.clone())
    }

    async fn list_expenses(&self, trip_id: TripId) -> ResultEngine<Vec<Expense>> {
        Ok(self
            .data()?
            .expenses
            .get(&trip_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_expense(&self, expense: &Expense) -> ResultEngine<Expense> {
        let mut data = self.writable()?;
        let expenses = data.expenses.entry(expense.trip_id).or_default();
        if expenses.iter().any(|e| e.id == expense.id) {
            return Err(EngineError::ExistingKey(expense.id.to_string()));
        }
        expenses.push(expense.clone());
        Ok(expense.clone())
    }

    async fn update_expense(&self, expense: &Expense) -> ResultEngine<Expense> {
        let mut data = self.writable()?;
        let stored = data
            .expenses
            .get_mut(&expense.trip_id)
            .and_then(|list| list.iter_mut().find(|e| e.id == expense.id))
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {}", expense.id)))?;
        *stored = expense.clone();
        Ok(expense.clone())
    }

    async fn delete_expense(&self, trip_id: TripId, expense_id: ExpenseId) -> ResultEngine<()> {
        let mut data = self.writable()?;
        let list = data.expenses.entry(trip_id).or_default();
        let before = list.len();
        list.retain(|e| e.id != expense_id);
        if list.len() == before {
            return Err(EngineError::KeyNotFound(format!("expense {expense_id}")));
        }
        Ok(())
    }

    async fn load_settled(&self, trip_id: TripId) -> ResultEngine<SettledPayments> {
        Ok(self
            .data()?
            .settled
            .get(&trip_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_settled(&self, trip_id: TripId, settled: &SettledPayments) -> ResultEngine<()> {
        self.writable()?.settled.insert(trip_id, settled.clone());
        Ok(())
    }
}
