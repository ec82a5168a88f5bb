//! Conversions from engine records to the JSON views of `api_types`.

use api_types::{
    expense::{ExpenseView, InstallmentView},
    settlement::{
        BalanceView, BreakdownView, InstallmentLineView, SettlementStatus, SettlementView,
    },
    trip::{ParticipantView, TripView},
};
use engine::{
    Balance, Expense, Money, PlannedTransfer, SettledStatus, SettlementBreakdown, Trip, TripState,
};

pub fn trip_view(state: &TripState) -> TripView {
    TripView {
        id: state.trip.id.0,
        name: state.trip.name.clone(),
        participants: state
            .trip
            .participants
            .iter()
            .map(|p| ParticipantView {
                id: p.id.0,
                name: p.name.clone(),
                role: p.role.as_str().to_string(),
                external: p.external,
            })
            .collect(),
        expense_count: state.expenses.len(),
        total_spent_minor: state.expenses.iter().map(|e| e.amount).sum::<Money>().cents(),
    }
}

pub fn expense_view(trip: &Trip, expense: &Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id.0,
        description: expense.description.clone(),
        amount_minor: expense.amount.cents(),
        payer: trip.display_name(expense.payer),
        participants: expense
            .participants
            .iter()
            .map(|p| trip.display_name(*p))
            .collect(),
        category: expense.category.as_str().to_string(),
        method: expense.method.as_str().to_string(),
        installment: expense.installment.as_ref().map(|i| InstallmentView {
            total: i.total,
            paid: i.paid,
            amount_minor: i.amount.cents(),
            first_due: i.first_due,
            next_due: i.next_due_date(),
        }),
        created_at: expense.created_at,
    }
}

pub fn balance_view(trip: &Trip, balance: &Balance) -> BalanceView {
    BalanceView {
        participant_id: balance.participant.0,
        name: trip.display_name(balance.participant),
        amount_minor: balance.amount.cents(),
    }
}

pub fn breakdown_view(breakdown: &SettlementBreakdown) -> BreakdownView {
    BreakdownView {
        cash_minor: breakdown.cash_total.cents(),
        installments_minor: breakdown.installment_total.cents(),
        installments: breakdown
            .installments
            .iter()
            .map(|line| InstallmentLineView {
                expense_id: line.expense_id.0,
                description: line.description.clone(),
                total: line.total,
                paid: line.paid,
                installment_amount_minor: line.installment_amount.cents(),
                per_person_amount_minor: line.per_person_amount.cents(),
                share_minor: line.share.cents(),
                next_due: line.next_due,
            })
            .collect(),
    }
}

fn status(status: SettledStatus) -> SettlementStatus {
    match status {
        SettledStatus::Pending => SettlementStatus::Pending,
        SettledStatus::Settled => SettlementStatus::Settled,
        SettledStatus::Stale => SettlementStatus::Stale,
    }
}

pub fn settlement_view(trip: &Trip, planned: &PlannedTransfer, with_breakdown: bool) -> SettlementView {
    let transfer = &planned.transfer;
    SettlementView {
        id: transfer.id.to_string(),
        from_id: transfer.from.0,
        from: trip.display_name(transfer.from),
        to_id: transfer.to.0,
        to: trip.display_name(transfer.to),
        amount_minor: transfer.amount.cents(),
        status: status(planned.status),
        breakdown: with_breakdown.then(|| breakdown_view(&planned.breakdown)),
    }
}

#[cfg(test)]
mod tests {
    use engine::{ParticipantId, Participant, Role, Transfer, TransferId};

    use super::*;

    #[test]
    fn settlement_view_carries_names_and_status() {
        let alice = Participant::new("Alice", Role::Admin);
        let bob = Participant::new("Bob", Role::Member);
        let trip = Trip::new("Porto", vec![alice.clone(), bob.clone()]);
        let planned = PlannedTransfer {
            transfer: Transfer {
                id: TransferId::new(bob.id, alice.id, 0),
                from: bob.id,
                to: alice.id,
                amount: Money::new(12_50),
            },
            status: SettledStatus::Stale,
            breakdown: SettlementBreakdown::default(),
        };

        let view = settlement_view(&trip, &planned, false);
        assert_eq!(view.from, "Bob");
        assert_eq!(view.to, "Alice");
        assert_eq!(view.amount_minor, 12_50);
        assert_eq!(view.status, SettlementStatus::Stale);
        assert!(view.breakdown.is_none());
    }

    #[test]
    fn unknown_participant_falls_back_to_id() {
        let trip = Trip::new("Porto", Vec::new());
        let ghost = ParticipantId::new();
        let view = balance_view(
            &trip,
            &Balance {
                participant: ghost,
                amount: Money::new(-5_00),
            },
        );
        assert_eq!(view.name, ghost.to_string());
    }
}
