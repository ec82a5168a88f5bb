//! Balance aggregation.
//!
//! Reduces a trip's expenses into one net [`Money`] position per participant:
//! positive means the participant is owed money, negative means they owe.
//!
//! Each expense credits the payer with the full amount and debits every
//! member of the sharing group with their [`Money::split`] share. Shares add up
//! exactly to the amount, so the balances of a closed roster always sum to
//! zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Expense, Money, Participant, ParticipantId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub participant: ParticipantId,
    pub amount: Money,
}

/// Net balances of a trip, kept in roster order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    entries: Vec<Balance>,
}

impl Balances {
    pub fn from_entries(entries: Vec<Balance>) -> Self {
        Self { entries }
    }

    /// Balance of `participant`; zero for people without an entry.
    pub fn get(&self, participant: ParticipantId) -> Money {
        self.entries
            .iter()
            .find(|b| b.participant == participant)
            .map(|b| b.amount)
            .unwrap_or(Money::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Balance> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Money {
        self.entries.iter().map(|b| b.amount).sum()
    }

    /// Entries sorted creditors first. Equal amounts keep roster order.
    pub fn sorted_desc(&self) -> Vec<Balance> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
        sorted
    }

    pub fn as_map(&self) -> HashMap<ParticipantId, Money> {
        self.entries
            .iter()
            .map(|b| (b.participant, b.amount))
            .collect()
    }
}

/// Computes the net balance of every roster member.
///
/// Expenses with an empty sharing group have no settlement effect. Payers or
/// sharers missing from the roster get no entry, so their part of the expense
/// is not reflected (the remaining balances no longer sum to zero).
pub fn compute_balances(participants: &[Participant], expenses: &[Expense]) -> Balances {
    let mut entries: Vec<Balance> = participants
        .iter()
        .map(|p| Balance {
            participant: p.id,
            amount: Money::ZERO,
        })
        .collect();
    let index: HashMap<ParticipantId, usize> = participants
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.id, idx))
        .collect();

    for expense in expenses {
        if expense.participants.is_empty() {
            continue;
        }

        match index.get(&expense.payer) {
            Some(&idx) => entries[idx].amount += expense.amount,
            None => warn!(
                expense = %expense.id,
                payer = %expense.payer,
                "payer is not in the trip roster, credit dropped"
            ),
        }

        let shares = expense.amount.split(expense.participants.len());
        for (participant, share) in expense.participants.iter().zip(shares) {
            match index.get(participant) {
                Some(&idx) => entries[idx].amount -= share,
                None => warn!(
                    expense = %expense.id,
                    participant = %participant,
                    "sharer is not in the trip roster, debit dropped"
                ),
            }
        }
    }

    Balances { entries }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{Category, ExpenseId, PaymentMethod, Role, TripId};

    fn people(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|n| Participant::new(*n, Role::Member))
            .collect()
    }

    fn expense(payer: ParticipantId, amount: i64, sharers: &[ParticipantId]) -> Expense {
        Expense {
            id: ExpenseId::new(),
            trip_id: TripId::new(),
            description: "test".to_string(),
            amount: Money::new(amount),
            payer,
            participants: sharers.to_vec(),
            category: Category::Other,
            method: PaymentMethod::Cash,
            installment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn two_people_one_expense() {
        let roster = people(&["A", "B"]);
        let (a, b) = (roster[0].id, roster[1].id);
        let balances = compute_balances(&roster, &[expense(a, 100_00, &[a, b])]);
        assert_eq!(balances.get(a), Money::new(50_00));
        assert_eq!(balances.get(b), Money::new(-50_00));
        assert_eq!(balances.total(), Money::ZERO);
    }

    #[test]
    fn three_people_two_payers() {
        let roster = people(&["A", "B", "C"]);
        let (a, b, c) = (roster[0].id, roster[1].id, roster[2].id);
        let balances = compute_balances(
            &roster,
            &[expense(a, 90_00, &[a, b, c]), expense(b, 30_00, &[a, b, c])],
        );
        assert_eq!(balances.get(a), Money::new(50_00));
        assert_eq!(balances.get(b), Money::new(-10_00));
        assert_eq!(balances.get(c), Money::new(-40_00));
        assert_eq!(balances.total(), Money::ZERO);
    }

    #[test]
    fn empty_sharing_group_has_no_effect() {
        let roster = people(&["A", "B"]);
        let (a, b) = (roster[0].id, roster[1].id);
        let balances = compute_balances(&roster, &[expense(a, 100_00, &[])]);
        assert_eq!(balances.get(a), Money::ZERO);
        assert_eq!(balances.get(b), Money::ZERO);
    }

    #[test]
    fn payer_outside_group_is_credited_in_full() {
        let roster = people(&["A", "B", "C"]);
        let (a, b, c) = (roster[0].id, roster[1].id, roster[2].id);
        let balances = compute_balances(&roster, &[expense(a, 100, &[b, c])]);
        assert_eq!(balances.get(a), Money::new(100));
        assert_eq!(balances.get(b), Money::new(-50));
        assert_eq!(balances.get(c), Money::new(-50));
    }

    #[test]
    fn unknown_payer_is_not_reflected() {
        let roster = people(&["A", "B"]);
        let (a, b) = (roster[0].id, roster[1].id);
        let ghost = ParticipantId::new();
        let balances = compute_balances(&roster, &[expense(ghost, 100, &[a, b])]);
        assert_eq!(balances.len(), 2);
        assert_eq!(balances.get(a), Money::new(-50));
        assert_eq!(balances.get(b), Money::new(-50));
        assert_eq!(balances.get(ghost), Money::ZERO);
    }

    #[test]
    fn sorted_desc_puts_creditors_first_and_keeps_ties_stable() {
        let roster = people(&["A", "B", "C", "D"]);
        let ids: Vec<_> = roster.iter().map(|p| p.id).collect();
        let balances = compute_balances(
            &roster,
            &[expense(ids[3], 400, &[ids[0], ids[1], ids[2], ids[3]])],
        );
        let sorted: Vec<_> = balances.sorted_desc().iter().map(|b| b.participant).collect();
        assert_eq!(sorted, vec![ids[3], ids[0], ids[1], ids[2]]);
    }
}
