use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod trip {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantView {
        pub id: Uuid,
        pub name: String,
        /// `admin` or `member`.
        pub role: String,
        pub external: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripView {
        pub id: Uuid,
        pub name: String,
        pub participants: Vec<ParticipantView>,
        pub expense_count: usize,
        pub total_spent_minor: i64,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InstallmentView {
        pub total: u32,
        pub paid: u32,
        pub amount_minor: i64,
        pub first_due: NaiveDate,
        pub next_due: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        pub amount_minor: i64,
        pub payer: String,
        /// Display names of the people sharing the expense.
        pub participants: Vec<String>,
        pub category: String,
        /// `cash` or `installment`.
        pub method: String,
        pub installment: Option<InstallmentView>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub participant_id: Uuid,
        pub name: String,
        /// Positive: is owed money. Negative: owes money.
        pub amount_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettlementStatus {
        Pending,
        Settled,
        /// Marked as paid for an amount that no longer matches the plan.
        Stale,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InstallmentLineView {
        pub expense_id: Uuid,
        pub description: String,
        pub total: u32,
        pub paid: u32,
        pub installment_amount_minor: i64,
        pub per_person_amount_minor: i64,
        pub share_minor: i64,
        pub next_due: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BreakdownView {
        pub cash_minor: i64,
        pub installments_minor: i64,
        pub installments: Vec<InstallmentLineView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: String,
        pub from_id: Uuid,
        pub from: String,
        pub to_id: Uuid,
        pub to: String,
        pub amount_minor: i64,
        pub status: SettlementStatus,
        pub breakdown: Option<BreakdownView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementsResponse {
        pub settlements: Vec<SettlementView>,
        /// Balances the plan could not clear.
        pub unresolved: Vec<BalanceView>,
    }
}
