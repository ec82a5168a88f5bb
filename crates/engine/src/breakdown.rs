//! Cash/installment breakdown of a transfer.
//!
//! For a debtor → creditor pair, collects the expenses the creditor paid and
//! the debtor shares, and splits the debtor's shares by payment method.
//! The projection is read-only: it never touches the ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Expense, ExpenseId, Money, ParticipantId, PaymentMethod};

/// Per-expense detail of an installment purchase inside a breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentLine {
    pub expense_id: ExpenseId,
    pub description: String,
    pub total: u32,
    pub paid: u32,
    pub installment_amount: Money,
    /// Debtor's part of a single installment.
    pub per_person_amount: Money,
    /// Debtor's share of the whole expense.
    pub share: Money,
    pub next_due: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementBreakdown {
    pub cash_total: Money,
    pub installment_total: Money,
    pub installments: Vec<InstallmentLine>,
}

impl SettlementBreakdown {
    pub fn total(&self) -> Money {
        self.cash_total + self.installment_total
    }

    pub fn has_installments(&self) -> bool {
        !self.installments.is_empty()
    }
}

/// Builds the breakdown of what `debtor` owes `creditor` expense by expense.
pub fn settlement_breakdown(
    debtor: ParticipantId,
    creditor: ParticipantId,
    expenses: &[Expense],
) -> SettlementBreakdown {
    let mut breakdown = SettlementBreakdown::default();

    for expense in expenses.iter().filter(|e| e.payer == creditor) {
        let Some(position) = expense.share_position(debtor) else {
            continue;
        };
        let sharers = expense.participants.len();
        let share = expense.amount.share_at(sharers, position);

        match (expense.method, expense.installment) {
            (PaymentMethod::Installment, Some(installment)) => {
                breakdown.installment_total += share;
                breakdown.installments.push(InstallmentLine {
                    expense_id: expense.id,
                    description: expense.description.clone(),
                    total: installment.total,
                    paid: installment.paid,
                    installment_amount: installment.amount,
                    per_person_amount: installment.per_person_amount(sharers, position),
                    share,
                    next_due: installment.next_due_date(),
                });
            }
            _ => breakdown.cash_total += share,
        }
    }

    breakdown
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{Category, Installment, TripId};

    fn expense(
        payer: ParticipantId,
        amount: i64,
        sharers: &[ParticipantId],
        installment: Option<Installment>,
    ) -> Expense {
        Expense {
            id: ExpenseId::new(),
            trip_id: TripId::new(),
            description: "item".to_string(),
            amount: Money::new(amount),
            payer,
            participants: sharers.to_vec(),
            category: Category::Shopping,
            method: if installment.is_some() {
                PaymentMethod::Installment
            } else {
                PaymentMethod::Cash
            },
            installment,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn partitions_cash_and_installment_shares() {
        let (a, b, c) = (ParticipantId::new(), ParticipantId::new(), ParticipantId::new());
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let schedule = Installment::new(4, due, Money::new(40_00)).paid(1);
        let expenses = vec![
            expense(a, 60_00, &[a, b, c], None),
            expense(a, 160_00, &[a, b], Some(schedule)),
            // paid by someone else: ignored
            expense(c, 90_00, &[a, b, c], None),
            // debtor not sharing: ignored
            expense(a, 10_00, &[a, c], None),
        ];

        let breakdown = settlement_breakdown(b, a, &expenses);
        assert_eq!(breakdown.cash_total, Money::new(20_00));
        assert_eq!(breakdown.installment_total, Money::new(80_00));
        assert_eq!(breakdown.total(), Money::new(100_00));
        assert_eq!(breakdown.installments.len(), 1);

        let line = &breakdown.installments[0];
        assert_eq!((line.total, line.paid), (4, 1));
        assert_eq!(line.installment_amount, Money::new(40_00));
        assert_eq!(line.per_person_amount, Money::new(20_00));
        assert_eq!(line.next_due, NaiveDate::from_ymd_opt(2026, 4, 1));
    }

    #[test]
    fn breakdown_is_idempotent() {
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let expenses = vec![expense(a, 33_33, &[a, b], None)];
        let first = settlement_breakdown(b, a, &expenses);
        let second = settlement_breakdown(b, a, &expenses);
        assert_eq!(first, second);
        assert_eq!(first.cash_total, Money::new(16_66));
    }

    #[test]
    fn unrelated_pair_is_empty() {
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let breakdown = settlement_breakdown(a, b, &[]);
        assert_eq!(breakdown, SettlementBreakdown::default());
        assert!(!breakdown.has_installments());
    }
}
