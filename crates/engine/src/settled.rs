//! Settled-transfer bookkeeping.
//!
//! Records which planned transfers the user marked as paid. Each mark keeps
//! the amount of the transfer at marking time: after balances change, a mark
//! only applies if the transfer with the same id still carries that amount.
//! Settlement is all-or-nothing per transfer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Money, ParticipantId, SettlementPlan, Transfer, TransferId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledMark {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
    pub settled_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadySettled,
    /// The id matches no transfer of the current plan; nothing was recorded.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettledStatus {
    Pending,
    Settled,
    /// Marked earlier for a different amount.
    Stale,
}

/// Set of settled transfers of one trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettledPayments {
    marks: BTreeMap<TransferId, SettledMark>,
}

impl SettledPayments {
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn contains(&self, id: &TransferId) -> bool {
        self.marks.contains_key(id)
    }

    pub fn mark(&self, id: &TransferId) -> Option<&SettledMark> {
        self.marks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransferId, &SettledMark)> {
        self.marks.iter()
    }

    /// Whether any mark names `participant` as payer or receiver.
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.marks
            .values()
            .any(|m| m.from == participant || m.to == participant)
    }

    pub fn status(&self, transfer: &Transfer) -> SettledStatus {
        match self.marks.get(&transfer.id) {
            None => SettledStatus::Pending,
            Some(mark) if mark.amount == transfer.amount => SettledStatus::Settled,
            Some(_) => SettledStatus::Stale,
        }
    }

    pub fn is_settled(&self, transfer: &Transfer) -> bool {
        self.status(transfer) == SettledStatus::Settled
    }

    /// Marks transfer `id` of `plan` as settled.
    ///
    /// Ids absent from the plan are a no-op reported as [`MarkOutcome::Stale`].
    /// A stale mark for the same id is overwritten with the current amount.
    pub fn settle(
        &mut self,
        id: &TransferId,
        plan: &SettlementPlan,
        now: DateTime<Utc>,
    ) -> MarkOutcome {
        let Some(transfer) = plan.transfer(id) else {
            warn!(transfer = %id, "transfer no longer planned, settle ignored");
            return MarkOutcome::Stale;
        };
        if self.is_settled(transfer) {
            return MarkOutcome::AlreadySettled;
        }
        self.marks.insert(
            id.clone(),
            SettledMark {
                from: transfer.from,
                to: transfer.to,
                amount: transfer.amount,
                settled_at: now,
            },
        );
        MarkOutcome::Marked
    }

    /// Transfers of `plan` not yet settled (pending or stale).
    pub fn pending<'a>(&'a self, plan: &'a SettlementPlan) -> impl Iterator<Item = &'a Transfer> {
        plan.transfers.iter().filter(|t| !self.is_settled(t))
    }

    /// Marks that no longer apply to any transfer of `plan`.
    pub fn stale_ids(&self, plan: &SettlementPlan) -> Vec<TransferId> {
        self.marks
            .iter()
            .filter(|(id, mark)| {
                plan.transfer(id)
                    .is_none_or(|transfer| transfer.amount != mark.amount)
            })
            .map(|(id, _)| id.clone())
            .collect()
    }
}
