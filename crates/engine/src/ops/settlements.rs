use chrono::Utc;
use tracing::{info, warn};

use crate::{
    Balances, EngineError, MarkOutcome, ParticipantId, ResultEngine, SettlementBreakdown,
    SettlementPlan, Transfer, TransferId, TripId, TripStore, compute_balances,
    plan_settlements, settlement_breakdown, share_message,
};

use super::{Engine, PlannedTransfer};

impl<S: TripStore> Engine<S> {
    /// Net balance of every roster member, creditors first.
    ///
    /// Equal balances keep roster order.
    pub fn balances(&self, trip_id: TripId) -> ResultEngine<Balances> {
        let state = self.trip(trip_id)?;
        let balances = compute_balances(&state.trip.participants, &state.expenses);
        Ok(Balances::from_entries(balances.sorted_desc()))
    }

    /// Recomputes the transfers that settle the current balances.
    pub fn settlement_plan(&self, trip_id: TripId) -> ResultEngine<SettlementPlan> {
        let state = self.trip(trip_id)?;
        let balances = compute_balances(&state.trip.participants, &state.expenses);
        Ok(plan_settlements(
            &balances,
            &state.expenses,
            &self.options.planner,
        ))
    }

    /// Every planned transfer with its settled status and breakdown.
    pub fn settlements(&self, trip_id: TripId) -> ResultEngine<Vec<PlannedTransfer>> {
        let state = self.trip(trip_id)?;
        let plan = self.settlement_plan(trip_id)?;
        for id in state.settled.stale_ids(&plan) {
            warn!(trip = %trip_id, transfer = %id, "settled mark no longer matches the plan");
        }
        Ok(plan
            .transfers
            .into_iter()
            .map(|transfer| PlannedTransfer {
                status: state.settled.status(&transfer),
                breakdown: settlement_breakdown(transfer.from, transfer.to, &state.expenses),
                transfer,
            })
            .collect())
    }

    /// Planned transfers that are not settled yet.
    pub fn pending_settlements(&self, trip_id: TripId) -> ResultEngine<Vec<Transfer>> {
        let state = self.trip(trip_id)?;
        let plan = self.settlement_plan(trip_id)?;
        Ok(state.settled.pending(&plan).cloned().collect())
    }

    /// Breakdown of a planned transfer.
    pub fn breakdown(
        &self,
        trip_id: TripId,
        transfer_id: &TransferId,
    ) -> ResultEngine<SettlementBreakdown> {
        let plan = self.settlement_plan(trip_id)?;
        let transfer = plan
            .transfer(transfer_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("transfer {transfer_id}")))?;
        self.breakdown_between(trip_id, transfer.from, transfer.to)
    }

    /// Breakdown of what `debtor` owes `creditor`, planned or not.
    pub fn breakdown_between(
        &self,
        trip_id: TripId,
        debtor: ParticipantId,
        creditor: ParticipantId,
    ) -> ResultEngine<SettlementBreakdown> {
        let state = self.trip(trip_id)?;
        Ok(settlement_breakdown(debtor, creditor, &state.expenses))
    }

    pub fn is_settled(&self, trip_id: TripId, transfer_id: &TransferId) -> ResultEngine<bool> {
        let state = self.trip(trip_id)?;
        let plan = self.settlement_plan(trip_id)?;
        Ok(plan
            .transfer(transfer_id)
            .is_some_and(|transfer| state.settled.is_settled(transfer)))
    }

    /// Marks a planned transfer as paid and persists the settled set.
    ///
    /// An id that matches no current transfer is a no-op reported as
    /// [`MarkOutcome::Stale`].
    pub async fn mark_settled(
        &mut self,
        trip_id: TripId,
        transfer_id: &TransferId,
    ) -> ResultEngine<MarkOutcome> {
        let plan = self.settlement_plan(trip_id)?;
        let state = self.trip_mut(trip_id)?;
        let snapshot = state.clone();

        let outcome = state.settled.settle(transfer_id, &plan, Utc::now());
        if outcome != MarkOutcome::Marked {
            return Ok(outcome);
        }
        let settled = state.settled.clone();

        match self.store.save_settled(trip_id, &settled).await {
            Ok(()) => {
                info!(trip = %trip_id, transfer = %transfer_id, "transfer settled");
                Ok(outcome)
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Shareable text listing the pending transfers and their breakdowns.
    pub fn share_message(&self, trip_id: TripId) -> ResultEngine<String> {
        let state = self.trip(trip_id)?;
        let pending: Vec<_> = self
            .pending_settlements(trip_id)?
            .into_iter()
            .map(|transfer| {
                let breakdown = settlement_breakdown(transfer.from, transfer.to, &state.expenses);
                (transfer, breakdown)
            })
            .collect();
        Ok(share_message(&state.trip, &pending))
    }
}
