use tracing::info;

use crate::{
    EngineError, Expense, ExpenseDraft, ExpenseId, Money, ResultEngine, TripId, TripStore,
};

use super::Engine;

/// Sum of the trip's expense amounts once `expense` is added, or swapped in
/// for the stored expense with the same id.
///
/// Keeping this total within `i64` bounds every balance the aggregator can
/// produce.
fn trip_total_with(expenses: &[Expense], expense: &Expense) -> ResultEngine<Money> {
    let out_of_range = || {
        EngineError::Validation("trip total exceeds the supported amount range".to_string())
    };
    let mut total = expenses
        .iter()
        .try_fold(Money::ZERO, |acc, e| acc.checked_add(e.amount))
        .ok_or_else(out_of_range)?;
    if let Some(replaced) = expenses.iter().find(|e| e.id == expense.id) {
        total = total.checked_sub(replaced.amount).ok_or_else(out_of_range)?;
    }
    total.checked_add(expense.amount).ok_or_else(out_of_range)
}

impl<S: TripStore> Engine<S> {
    pub fn expenses(&self, trip_id: TripId) -> ResultEngine<&[Expense]> {
        Ok(&self.trip(trip_id)?.expenses)
    }

    pub fn expense(&self, trip_id: TripId, expense_id: ExpenseId) -> ResultEngine<&Expense> {
        self.trip(trip_id)?.expense(expense_id)
    }

    /// Validates `draft` and records it as a new expense of the trip.
    pub async fn add_expense(
        &mut self,
        trip_id: TripId,
        draft: ExpenseDraft,
    ) -> ResultEngine<ExpenseId> {
        let state = self.trip_mut(trip_id)?;
        let expense = draft.validate(&state.trip)?;
        trip_total_with(&state.expenses, &expense)?;
        let expense_id = expense.id;

        let snapshot = state.clone();
        state.expenses.push(expense.clone());

        match self.store.create_expense(&expense).await {
            Ok(stored) => {
                *self.trip_mut(trip_id)?.expense_mut(expense_id)? = stored;
                info!(trip = %trip_id, expense = %expense_id, amount = %expense.amount, "expense added");
                Ok(expense_id)
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Replaces an expense with the validated content of `draft`, keeping its
    /// id and creation time.
    pub async fn update_expense(
        &mut self,
        trip_id: TripId,
        expense_id: ExpenseId,
        draft: ExpenseDraft,
    ) -> ResultEngine<()> {
        let state = self.trip_mut(trip_id)?;
        let created_at = state.expense(expense_id)?.created_at;
        let updated = draft.validate_with_id(&state.trip, expense_id, created_at)?;
        trip_total_with(&state.expenses, &updated)?;

        let snapshot = state.clone();
        *state.expense_mut(expense_id)? = updated.clone();

        match self.store.update_expense(&updated).await {
            Ok(stored) => {
                *self.trip_mut(trip_id)?.expense_mut(expense_id)? = stored;
                info!(trip = %trip_id, expense = %expense_id, "expense updated");
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    pub async fn delete_expense(&mut self, trip_id: TripId, expense_id: ExpenseId) -> ResultEngine<()> {
        let state = self.trip_mut(trip_id)?;
        state.expense(expense_id)?;

        let snapshot = state.clone();
        state.expenses.retain(|e| e.id != expense_id);

        match self.store.delete_expense(trip_id, expense_id).await {
            Ok(()) => {
                info!(trip = %trip_id, expense = %expense_id, "expense deleted");
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }
}
