//! Ledger balance & settlement engine for shared trip expenses.
//!
//! The pure building blocks work on plain data:
//! - [`compute_balances`] reduces expenses to a net balance per participant;
//! - [`plan_settlements`] turns balances into directed transfers;
//! - [`settlement_breakdown`] explains a transfer in cash and installment shares;
//! - [`SettledPayments`] tracks which transfers were marked as paid;
//! - [`share_message`] renders the pending transfers as text.
//!
//! [`Engine`] ties them to a [`TripStore`], keeping an in-memory projection of
//! each opened trip and rolling it back when a write fails.

pub use balances::{Balance, Balances, compute_balances};
pub use breakdown::{InstallmentLine, SettlementBreakdown, settlement_breakdown};
pub use error::EngineError;
pub use expense::{
    Category, Expense, ExpenseDraft, ExpenseId, Installment, MAX_EXPENSE_AMOUNT, PaymentMethod,
};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, EngineOptions, PlannedTransfer};
pub use participant::{Participant, ParticipantId, Role};
pub use planner::{
    DEFAULT_MAX_ITERATIONS, PlannerMode, PlannerOptions, SettlementPlan, Transfer, TransferId,
    apply_transfers, plan_settlements,
};
pub use settled::{MarkOutcome, SettledMark, SettledPayments, SettledStatus};
pub use store::{MemoryStore, TripStore};
pub use summary::share_message;
pub use trip::{Trip, TripId, TripState};

mod balances;
mod breakdown;
mod error;
mod expense;
mod money;
mod ops;
mod participant;
mod planner;
mod settled;
mod store;
mod summary;
mod trip;

pub type ResultEngine<T> = Result<T, EngineError>;
