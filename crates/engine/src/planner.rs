//! Settlement planning.
//!
//! Turns net [`Balances`] into directed [`Transfer`]s (debtor → creditor)
//! that bring every balance back to zero.
//!
//! Two strategies are available through [`PlannerMode`]:
//! - [`PlannerMode::Optimized`]: greedy matching of the largest debt with the
//!   largest credit, which keeps the number of transfers low.
//! - [`PlannerMode::Simple`]: one transfer per pair of people who share
//!   expenses, carrying their pairwise net debt. More transfers, but each one
//!   maps to expenses the two people actually had in common.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Balance, Balances, Expense, Money, ParticipantId};

/// Default safety ceiling for greedy matching rounds.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Identifier of a planned transfer.
///
/// Built from the (from, to) pair and an epoch counting repeated pairings
/// inside the same plan, so it does not depend on the rank of the transfer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new(from: ParticipantId, to: ParticipantId, epoch: u32) -> Self {
        Self(format!("{from}:{to}:{epoch}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TransferId {
    fn from(value: String) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<&str> for TransferId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerMode {
    #[default]
    Optimized,
    Simple,
}

impl PlannerMode {
    /// Maps the "optimize transfers" preference to a mode.
    pub fn from_optimize(optimize: bool) -> Self {
        if optimize { Self::Optimized } else { Self::Simple }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannerOptions {
    pub mode: PlannerMode,
    /// Balances within this distance of zero are considered settled.
    pub tolerance: Money,
    /// Upper bound on greedy matching rounds.
    pub max_iterations: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            mode: PlannerMode::Optimized,
            tolerance: Money::ZERO,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Output of a planner run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettlementPlan {
    pub transfers: Vec<Transfer>,
    /// Residual balances the transfers do not clear (iteration ceiling hit,
    /// or balances that do not sum to zero).
    pub unresolved: Vec<Balance>,
}

impl SettlementPlan {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn transfer(&self, id: &TransferId) -> Option<&Transfer> {
        self.transfers.iter().find(|t| &t.id == id)
    }

    pub fn total(&self) -> Money {
        self.transfers.iter().map(|t| t.amount).sum()
    }
}

/// Assigns pair-based ids in emission order.
#[derive(Default)]
struct TransferIds {
    epochs: HashMap<(ParticipantId, ParticipantId), u32>,
}

impl TransferIds {
    fn transfer(&mut self, from: ParticipantId, to: ParticipantId, amount: Money) -> Transfer {
        let epoch = self.epochs.entry((from, to)).or_insert(0);
        let id = TransferId::new(from, to, *epoch);
        *epoch += 1;
        Transfer {
            id,
            from,
            to,
            amount,
        }
    }
}

/// Plans the transfers that settle `balances`.
///
/// `expenses` is only read by [`PlannerMode::Simple`].
pub fn plan_settlements(
    balances: &Balances,
    expenses: &[Expense],
    options: &PlannerOptions,
) -> SettlementPlan {
    let transfers = match options.mode {
        PlannerMode::Optimized => greedy_transfers(balances, options),
        PlannerMode::Simple => pairwise_transfers(balances, expenses, options),
    };

    let unresolved: Vec<Balance> = apply_transfers(balances, &transfers)
        .iter()
        .filter(|b| b.amount.abs() > options.tolerance)
        .copied()
        .collect();
    if !unresolved.is_empty() {
        warn!(
            unresolved = unresolved.len(),
            residual = %unresolved.iter().map(|b| b.amount.abs()).sum::<Money>(),
            "settlement plan leaves balances unmatched"
        );
    }
    debug!(
        mode = ?options.mode,
        transfers = transfers.len(),
        "settlement plan computed"
    );

    SettlementPlan {
        transfers,
        unresolved,
    }
}

/// Applies `transfers` to `balances`: the payer's balance rises, the
/// receiver's falls.
pub fn apply_transfers(balances: &Balances, transfers: &[Transfer]) -> Balances {
    let mut entries: Vec<Balance> = balances.iter().copied().collect();
    for transfer in transfers {
        for entry in entries.iter_mut() {
            if entry.participant == transfer.from {
                entry.amount += transfer.amount;
            } else if entry.participant == transfer.to {
                entry.amount -= transfer.amount;
            }
        }
    }
    Balances::from_entries(entries)
}

fn greedy_transfers(balances: &Balances, options: &PlannerOptions) -> Vec<Transfer> {
    let tolerance = options.tolerance;
    let mut debtors: Vec<Balance> = balances
        .iter()
        .filter(|b| b.amount < -tolerance)
        .copied()
        .collect();
    let mut creditors: Vec<Balance> = balances
        .iter()
        .filter(|b| b.amount > tolerance)
        .copied()
        .collect();
    // Stable sorts: ties keep the incoming balance order.
    debtors.sort_by(|a, b| a.amount.cmp(&b.amount));
    creditors.sort_by(|a, b| b.amount.cmp(&a.amount));

    let mut ids = TransferIds::default();
    let mut transfers = Vec::new();
    let (mut d, mut c) = (0, 0);
    let mut rounds = 0;

    while d < debtors.len() && c < creditors.len() {
        if rounds == options.max_iterations {
            warn!(
                max_iterations = options.max_iterations,
                "settlement matching hit its iteration ceiling"
            );
            break;
        }
        rounds += 1;

        let debtor = &mut debtors[d];
        let creditor = &mut creditors[c];
        let amount = debtor.amount.abs().min(creditor.amount);
        transfers.push(ids.transfer(debtor.participant, creditor.participant, amount));
        debtor.amount += amount;
        creditor.amount -= amount;

        if debtor.amount.abs() <= tolerance {
            d += 1;
        }
        if creditor.amount.abs() <= tolerance {
            c += 1;
        }
    }

    transfers
}

fn pairwise_transfers(
    balances: &Balances,
    expenses: &[Expense],
    options: &PlannerOptions,
) -> Vec<Transfer> {
    let roster: HashSet<ParticipantId> = balances.iter().map(|b| b.participant).collect();

    // Canonical (lo, hi) key; positive net means hi owes lo.
    let mut order: Vec<(ParticipantId, ParticipantId)> = Vec::new();
    let mut nets: HashMap<(ParticipantId, ParticipantId), Money> = HashMap::new();

    for expense in expenses {
        if expense.participants.is_empty() || !roster.contains(&expense.payer) {
            continue;
        }
        let shares = expense.amount.split(expense.participants.len());
        for (sharer, share) in expense.participants.iter().zip(shares) {
            if *sharer == expense.payer || !roster.contains(sharer) {
                continue;
            }
            let (key, signed) = if expense.payer < *sharer {
                ((expense.payer, *sharer), share)
            } else {
                ((*sharer, expense.payer), -share)
            };
            let net = nets.entry(key).or_insert_with(|| {
                order.push(key);
                Money::ZERO
            });
            *net += signed;
        }
    }

    let mut ids = TransferIds::default();
    order
        .into_iter()
        .filter_map(|key @ (lo, hi)| {
            let net = nets.get(&key).copied().unwrap_or(Money::ZERO);
            if net.abs() <= options.tolerance {
                return None;
            }
            Some(if net.is_positive() {
                ids.transfer(hi, lo, net)
            } else {
                ids.transfer(lo, hi, net.abs())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> ParticipantId {
        ParticipantId::new()
    }

    fn balances(entries: &[(ParticipantId, i64)]) -> Balances {
        Balances::from_entries(
            entries
                .iter()
                .map(|(p, a)| Balance {
                    participant: *p,
                    amount: Money::new(*a),
                })
                .collect(),
        )
    }

    #[test]
    fn single_debtor_single_creditor() {
        let (a, b) = (pid(), pid());
        let plan = plan_settlements(
            &balances(&[(a, 50_00), (b, -50_00)]),
            &[],
            &PlannerOptions::default(),
        );
        assert!(plan.is_complete());
        assert_eq!(plan.transfers.len(), 1);
        assert_eq!(plan.transfers[0].from, b);
        assert_eq!(plan.transfers[0].to, a);
        assert_eq!(plan.transfers[0].amount, Money::new(50_00));
        assert_eq!(plan.transfers[0].id, TransferId::new(b, a, 0));
    }

    #[test]
    fn zero_balances_need_no_transfer() {
        let (a, b, c) = (pid(), pid(), pid());
        let plan = plan_settlements(
            &balances(&[(a, 60_00), (b, 0), (c, -60_00)]),
            &[],
            &PlannerOptions::default(),
        );
        assert_eq!(plan.transfers.len(), 1);
        assert!(plan.transfers.iter().all(|t| t.from != b && t.to != b));
    }

    #[test]
    fn largest_debt_meets_largest_credit_first() {
        let (a, b, c, d) = (pid(), pid(), pid(), pid());
        let plan = plan_settlements(
            &balances(&[(a, 70), (b, 30), (c, -20), (d, -80)]),
            &[],
            &PlannerOptions::default(),
        );
        let flows: Vec<_> = plan
            .transfers
            .iter()
            .map(|t| (t.from, t.to, t.amount.cents()))
            .collect();
        assert_eq!(flows, vec![(d, a, 70), (d, b, 10), (c, b, 20)]);
        assert!(plan.is_complete());
    }

    #[test]
    fn tolerance_ignores_dust() {
        let (a, b, c) = (pid(), pid(), pid());
        let options = PlannerOptions {
            tolerance: Money::new(1),
            ..PlannerOptions::default()
        };
        let plan = plan_settlements(&balances(&[(a, 1), (b, -1), (c, 0)]), &[], &options);
        assert!(plan.transfers.is_empty());
        assert!(plan.is_complete());
    }

    #[test]
    fn iteration_ceiling_surfaces_unresolved_balances() {
        let creditor = pid();
        let debtors: Vec<_> = (0..5).map(|_| pid()).collect();
        let mut entries = vec![(creditor, 500)];
        entries.extend(debtors.iter().map(|d| (*d, -100)));
        let options = PlannerOptions {
            max_iterations: 3,
            ..PlannerOptions::default()
        };
        let plan = plan_settlements(&balances(&entries), &[], &options);
        assert_eq!(plan.transfers.len(), 3);
        assert!(!plan.is_complete());
        // creditor still owed 200, two debtors still owe 100 each
        assert_eq!(plan.unresolved.len(), 3);
        assert_eq!(
            plan.unresolved.iter().map(|b| b.amount).sum::<Money>(),
            Money::ZERO
        );
    }

    #[test]
    fn unbalanced_input_reports_residual() {
        let (a, b) = (pid(), pid());
        let plan = plan_settlements(
            &balances(&[(a, 100), (b, -60)]),
            &[],
            &PlannerOptions::default(),
        );
        assert_eq!(plan.transfers.len(), 1);
        assert_eq!(plan.unresolved, vec![Balance {
            participant: a,
            amount: Money::new(40),
        }]);
    }

    #[test]
    fn transfer_ids_depend_on_pair_not_rank() {
        let mut ids = TransferIds::default();
        let (a, b, c) = (pid(), pid(), pid());
        let first = ids.transfer(a, b, Money::new(1));
        let other = ids.transfer(c, b, Money::new(1));
        let again = ids.transfer(a, b, Money::new(1));
        assert_eq!(first.id, TransferId::new(a, b, 0));
        assert_eq!(other.id, TransferId::new(c, b, 0));
        assert_eq!(again.id, TransferId::new(a, b, 1));
    }

    #[test]
    fn mode_follows_optimize_preference() {
        assert_eq!(PlannerMode::from_optimize(true), PlannerMode::Optimized);
        assert_eq!(PlannerMode::from_optimize(false), PlannerMode::Simple);
    }
}
