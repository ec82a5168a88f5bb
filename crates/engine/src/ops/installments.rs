use tracing::{debug, info};

use crate::{EngineError, ExpenseId, Installment, ResultEngine, TripId, TripStore};

use super::Engine;

impl<S: TripStore> Engine<S> {
    /// Confirms one more paid installment of an expense.
    ///
    /// `paid` is clamped to `total`: on a fully paid schedule the call is a
    /// no-op and nothing is written. The in-memory expense is updated first and
    /// restored if the write fails.
    pub async fn advance_installment(
        &mut self,
        trip_id: TripId,
        expense_id: ExpenseId,
    ) -> ResultEngine<Installment> {
        let state = self.trip_mut(trip_id)?;
        let snapshot = state.clone();
        let expense = state.expense_mut(expense_id)?;
        let installment = expense.installment.as_mut().ok_or_else(|| {
            EngineError::Validation(format!("expense {expense_id} has no installment schedule"))
        })?;

        if !installment.advance() {
            debug!(expense = %expense_id, "installments already fully paid");
            return Ok(*installment);
        }
        let updated = expense.clone();

        match self.store.update_expense(&updated).await {
            Ok(stored) => {
                let expense = self.trip_mut(trip_id)?.expense_mut(expense_id)?;
                *expense = stored;
                let installment = expense.installment.ok_or_else(|| {
                    EngineError::Storage(format!(
                        "stored expense {expense_id} lost its installment schedule"
                    ))
                })?;
                info!(
                    expense = %expense_id,
                    paid = installment.paid,
                    total = installment.total,
                    "installment paid"
                );
                Ok(installment)
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }
}
