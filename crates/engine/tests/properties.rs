use chrono::NaiveDate;
use proptest::prelude::*;

use engine::{
    Expense, ExpenseDraft, Installment, Money, Participant, PlannerMode, PlannerOptions, Role,
    Trip, apply_transfers, compute_balances, plan_settlements,
};

fn roster(count: usize) -> Trip {
    let members = (0..count)
        .map(|idx| Participant::new(format!("member-{idx}"), Role::Member))
        .collect();
    Trip::new("property trip", members)
}

fn expenses(
    trip: &Trip,
    amounts: &[i64],
    payer_indexes: &[usize],
    share_masks: &[usize],
) -> Vec<Expense> {
    let count = trip.participants.len();
    amounts
        .iter()
        .enumerate()
        .map(|(idx, amount)| {
            let payer = trip.participants[payer_indexes.get(idx).copied().unwrap_or(0) % count].id;
            let mask = share_masks.get(idx).copied().unwrap_or(0);
            let sharers = trip
                .participants
                .iter()
                .enumerate()
                .filter(|(pos, _)| mask & (1 << pos) != 0)
                .map(|(_, p)| p.id);
            ExpenseDraft::new(format!("expense {idx}"))
                .amount(Money::new(*amount))
                .payer(payer)
                .shared_with(sharers)
                .validate(trip)
                .expect("generated expense is valid")
        })
        .collect()
}

proptest! {
    #[test]
    fn split_shares_add_up(amount in -1_000_000i64..=1_000_000, parts in 1usize..=12) {
        let shares = Money::new(amount).split(parts);
        prop_assert_eq!(shares.len(), parts);
        prop_assert_eq!(shares.iter().sum::<Money>(), Money::new(amount));
        let max = shares.iter().map(|s| s.cents()).max().unwrap_or(0);
        let min = shares.iter().map(|s| s.cents()).min().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }
}

proptest! {
    #[test]
    fn balances_sum_to_zero(
        member_count in 1usize..=6,
        amounts in prop::collection::vec(1i64..=100_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
        share_masks in prop::collection::vec(0usize..=63, 0..=30),
    ) {
        let trip = roster(member_count);
        let expenses = expenses(&trip, &amounts, &payer_indexes, &share_masks);
        let balances = compute_balances(&trip.participants, &expenses);
        prop_assert_eq!(balances.len(), member_count);
        prop_assert_eq!(balances.total(), Money::ZERO);
    }
}

proptest! {
    #[test]
    fn planned_transfers_clear_every_balance(
        member_count in 1usize..=6,
        amounts in prop::collection::vec(1i64..=100_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
        share_masks in prop::collection::vec(0usize..=63, 0..=30),
        simple in any::<bool>(),
    ) {
        let trip = roster(member_count);
        let expenses = expenses(&trip, &amounts, &payer_indexes, &share_masks);
        let balances = compute_balances(&trip.participants, &expenses);
        let options = PlannerOptions {
            mode: if simple { PlannerMode::Simple } else { PlannerMode::Optimized },
            ..PlannerOptions::default()
        };

        let plan = plan_settlements(&balances, &expenses, &options);
        prop_assert!(plan.is_complete());
        for transfer in &plan.transfers {
            prop_assert!(transfer.amount.is_positive());
            prop_assert_ne!(transfer.from, transfer.to);
        }
        let after = apply_transfers(&balances, &plan.transfers);
        prop_assert!(after.iter().all(|b| b.amount.is_zero()));

        if !simple {
            let nonzero = balances.iter().filter(|b| !b.amount.is_zero()).count();
            prop_assert!(plan.transfers.len() <= nonzero.saturating_sub(1));
        }
    }
}

proptest! {
    #[test]
    fn installment_progress_never_exceeds_total(
        total in 1u32..=24,
        paid in 0u32..=24,
        advances in 0usize..=40,
    ) {
        let due = NaiveDate::from_ymd_opt(2026, 1, 31).expect("valid date");
        let mut installment = Installment::new(total, due, Money::new(10_00)).paid(paid.min(total));
        for _ in 0..advances {
            installment.advance();
        }
        prop_assert!(installment.paid <= installment.total);
        prop_assert_eq!(installment.paid, (paid.min(total) + advances as u32).min(total));
        prop_assert_eq!(installment.next_due_date().is_none(), installment.is_settled());
    }
}
