//! Expense records.
//!
//! An [`Expense`] is a single financial event of a trip: one payer, an
//! amount and the group of participants sharing the cost. Purchases paid in
//! installments carry an [`Installment`] schedule.
//!
//! Expenses only enter the ledger through [`ExpenseDraft::validate`], so the
//! rest of the engine can rely on positive amounts and a consistent
//! installment schedule.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ParticipantId, ResultEngine, Trip, TripId};

/// Largest amount a single expense or installment may carry (one billion
/// currency units).
pub const MAX_EXPENSE_AMOUNT: Money = Money::new(1_000_000_000_00);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub Uuid);

impl ExpenseId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Transport,
    Lodging,
    Food,
    Activities,
    Shopping,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Lodging => "lodging",
            Self::Food => "food",
            Self::Activities => "activities",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transport" => Ok(Self::Transport),
            "lodging" => Ok(Self::Lodging),
            "food" => Ok(Self::Food),
            "activities" => Ok(Self::Activities),
            "shopping" => Ok(Self::Shopping),
            "other" => Ok(Self::Other),
            other => Err(EngineError::Validation(format!(
                "invalid category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Installment,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Installment => "installment",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "installment" => Ok(Self::Installment),
            other => Err(EngineError::Validation(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

/// Payment schedule of an expense bought in installments.
///
/// `paid` only moves forward and never exceeds `total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub total: u32,
    pub paid: u32,
    pub first_due: NaiveDate,
    /// Amount of a single installment.
    pub amount: Money,
}

impl Installment {
    pub fn new(total: u32, first_due: NaiveDate, amount: Money) -> Self {
        Self {
            total,
            paid: 0,
            first_due,
            amount,
        }
    }

    #[must_use]
    pub fn paid(mut self, paid: u32) -> Self {
        self.paid = paid;
        self
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.paid)
    }

    pub fn is_settled(&self) -> bool {
        self.paid >= self.total
    }

    /// Records one more paid installment, clamped to `total`.
    ///
    /// Returns `false` when the schedule was already fully paid.
    pub fn advance(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.paid += 1;
        true
    }

    /// Due date of the installment at zero-based `index`, one per month.
    pub fn due_date(&self, index: u32) -> Option<NaiveDate> {
        if index >= self.total {
            return None;
        }
        self.first_due.checked_add_months(Months::new(index))
    }

    /// Due date of the first installment still to be paid.
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        self.due_date(self.paid)
    }

    /// What each of `sharers` pays per installment, with the remainder
    /// assigned like [`Money::split`].
    pub fn per_person_amount(&self, sharers: usize, position: usize) -> Money {
        self.amount.share_at(sharers, position)
    }

    fn validate(&self) -> ResultEngine<()> {
        if self.total == 0 {
            return Err(EngineError::Validation(
                "installment count must be >= 1".to_string(),
            ));
        }
        if self.paid > self.total {
            return Err(EngineError::Validation(format!(
                "paid installments ({}) exceed total ({})",
                self.paid, self.total
            )));
        }
        if !self.amount.is_positive() {
            return Err(EngineError::Validation(
                "installment amount must be > 0".to_string(),
            ));
        }
        if self.amount > MAX_EXPENSE_AMOUNT {
            return Err(EngineError::Validation(format!(
                "installment amount must be <= {MAX_EXPENSE_AMOUNT}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub trip_id: TripId,
    pub description: String,
    pub amount: Money,
    pub payer: ParticipantId,
    /// Cost-sharing group. Order only decides who absorbs rounding cents.
    pub participants: Vec<ParticipantId>,
    pub category: Category,
    pub method: PaymentMethod,
    pub installment: Option<Installment>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Position of `participant` inside the sharing group.
    pub fn share_position(&self, participant: ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| *p == participant)
    }

    /// Share of the expense owed by `participant`, if they are in the group.
    pub fn share_of(&self, participant: ParticipantId) -> Option<Money> {
        let position = self.share_position(participant)?;
        Some(self.amount.share_at(self.participants.len(), position))
    }

    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.payer == participant || self.participants.contains(&participant)
    }
}

/// Unvalidated expense input.
///
/// Required fields are optional here so that a missing amount or payer is a
/// [`EngineError::Validation`] instead of a construction panic.
#[derive(Clone, Debug, Default)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Option<Money>,
    pub payer: Option<ParticipantId>,
    pub participants: Vec<ParticipantId>,
    pub category: Category,
    pub method: PaymentMethod,
    pub installment: Option<Installment>,
}

impl ExpenseDraft {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn payer(mut self, payer: ParticipantId) -> Self {
        self.payer = Some(payer);
        self
    }

    #[must_use]
    pub fn shared_with(mut self, participants: impl IntoIterator<Item = ParticipantId>) -> Self {
        self.participants = participants.into_iter().collect();
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Marks the expense as bought in installments.
    #[must_use]
    pub fn installment(mut self, installment: Installment) -> Self {
        self.method = PaymentMethod::Installment;
        self.installment = Some(installment);
        self
    }

    /// Validates the draft against the trip roster and builds the expense.
    pub fn validate(self, trip: &Trip) -> ResultEngine<Expense> {
        self.validate_with_id(trip, ExpenseId::new(), Utc::now())
    }

    pub(crate) fn validate_with_id(
        self,
        trip: &Trip,
        id: ExpenseId,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Expense> {
        let amount = self
            .amount
            .ok_or_else(|| EngineError::Validation("expense amount is required".to_string()))?;
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "expense amount must be > 0".to_string(),
            ));
        }
        if amount > MAX_EXPENSE_AMOUNT {
            return Err(EngineError::Validation(format!(
                "expense amount must be <= {MAX_EXPENSE_AMOUNT}"
            )));
        }

        let payer = self
            .payer
            .ok_or_else(|| EngineError::Validation("expense payer is required".to_string()))?;
        if trip.participant(payer).is_none() {
            return Err(EngineError::Validation(format!(
                "payer {payer} is not part of the trip"
            )));
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            if trip.participant(*participant).is_none() {
                return Err(EngineError::Validation(format!(
                    "participant {participant} is not part of the trip"
                )));
            }
            if !seen.insert(*participant) {
                return Err(EngineError::Validation(format!(
                    "participant {participant} listed twice"
                )));
            }
        }

        match (self.method, &self.installment) {
            (PaymentMethod::Cash, None) => {}
            (PaymentMethod::Cash, Some(_)) => {
                return Err(EngineError::Validation(
                    "cash expenses cannot carry an installment schedule".to_string(),
                ));
            }
            (PaymentMethod::Installment, None) => {
                return Err(EngineError::Validation(
                    "installment expenses require an installment schedule".to_string(),
                ));
            }
            (PaymentMethod::Installment, Some(installment)) => installment.validate()?,
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(EngineError::Validation(
                "expense description must not be empty".to_string(),
            ));
        }

        Ok(Expense {
            id,
            trip_id: trip.id,
            description: description.to_string(),
            amount,
            payer,
            participants: self.participants,
            category: self.category,
            method: self.method,
            installment: self.installment,
            created_at,
        })
    }
}

impl From<&Expense> for ExpenseDraft {
    fn from(expense: &Expense) -> Self {
        Self {
            description: expense.description.clone(),
            amount: Some(expense.amount),
            payer: Some(expense.payer),
            participants: expense.participants.clone(),
            category: expense.category,
            method: expense.method,
            installment: expense.installment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Participant, Role};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trip() -> (Trip, ParticipantId, ParticipantId) {
        let alice = Participant::new("Alice", Role::Admin);
        let bob = Participant::new("Bob", Role::Member);
        let (a, b) = (alice.id, bob.id);
        (Trip::new("Lisbon", vec![alice, bob]), a, b)
    }

    #[test]
    fn missing_amount_or_payer_is_rejected() {
        let (trip, a, _) = trip();
        let err = ExpenseDraft::new("Dinner").payer(a).validate(&trip).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("expense amount is required".to_string())
        );

        let err = ExpenseDraft::new("Dinner")
            .amount(Money::new(100))
            .validate(&trip)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("expense payer is required".to_string())
        );
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let (trip, a, b) = trip();
        let draft = ExpenseDraft::new("Refund?")
            .amount(Money::new(-5))
            .payer(a)
            .shared_with([a, b]);
        assert!(matches!(
            draft.validate(&trip),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn amount_above_ceiling_is_rejected() {
        let (trip, a, b) = trip();
        let draft = ExpenseDraft::new("Yacht")
            .amount(Money::new(i64::MAX))
            .payer(a)
            .shared_with([a, b]);
        assert_eq!(
            draft.validate(&trip),
            Err(EngineError::Validation(
                "expense amount must be <= 1000000000.00".to_string()
            ))
        );

        let at_ceiling = ExpenseDraft::new("Villa")
            .amount(MAX_EXPENSE_AMOUNT)
            .payer(a)
            .shared_with([a, b]);
        assert!(at_ceiling.validate(&trip).is_ok());

        let schedule = Installment::new(2, date(2026, 1, 10), Money::new(i64::MAX));
        let draft = ExpenseDraft::new("Boat")
            .amount(Money::new(100_00))
            .payer(a)
            .installment(schedule);
        assert!(matches!(
            draft.validate(&trip),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn unknown_and_duplicate_participants_are_rejected() {
        let (trip, a, b) = trip();
        let stranger = ParticipantId::new();
        let draft = ExpenseDraft::new("Taxi")
            .amount(Money::new(100))
            .payer(a)
            .shared_with([a, stranger]);
        assert!(draft.validate(&trip).is_err());

        let draft = ExpenseDraft::new("Taxi")
            .amount(Money::new(100))
            .payer(a)
            .shared_with([a, b, a]);
        assert!(draft.validate(&trip).is_err());
    }

    #[test]
    fn installment_method_requires_consistent_schedule() {
        let (trip, a, b) = trip();
        let mut draft = ExpenseDraft::new("Flight")
            .amount(Money::new(400_00))
            .payer(a)
            .shared_with([a, b]);
        draft.method = PaymentMethod::Installment;
        assert!(draft.clone().validate(&trip).is_err());

        let overpaid = Installment::new(4, date(2026, 1, 10), Money::new(100_00)).paid(5);
        assert!(draft.clone().installment(overpaid).validate(&trip).is_err());

        let ok = Installment::new(4, date(2026, 1, 10), Money::new(100_00));
        let expense = draft.installment(ok).validate(&trip).unwrap();
        assert_eq!(expense.method, PaymentMethod::Installment);
        assert_eq!(expense.installment, Some(ok));
    }

    #[test]
    fn advance_clamps_at_total() {
        let mut installment = Installment::new(2, date(2026, 1, 31), Money::new(50_00));
        assert!(installment.advance());
        assert!(installment.advance());
        assert!(!installment.advance());
        assert_eq!(installment.paid, 2);
        assert!(installment.is_settled());
        assert_eq!(installment.remaining(), 0);
    }

    #[test]
    fn due_dates_move_by_month() {
        let installment = Installment::new(3, date(2026, 1, 31), Money::new(10_00)).paid(1);
        assert_eq!(installment.due_date(0), Some(date(2026, 1, 31)));
        assert_eq!(installment.next_due_date(), Some(date(2026, 2, 28)));
        assert_eq!(installment.due_date(3), None);
    }

    #[test]
    fn share_of_uses_split_position() {
        let (trip, a, b) = trip();
        let expense = ExpenseDraft::new("Museum")
            .amount(Money::new(101))
            .payer(a)
            .shared_with([a, b])
            .validate(&trip)
            .unwrap();
        assert_eq!(expense.share_of(a), Some(Money::new(51)));
        assert_eq!(expense.share_of(b), Some(Money::new(50)));
        assert_eq!(expense.share_of(ParticipantId::new()), None);
    }
}
