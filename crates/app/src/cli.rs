use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::Money;
use uuid::Uuid;

use crate::settings::Overrides;

#[derive(Parser, Debug)]
#[command(name = "tripsplit")]
#[command(about = "Split trip expenses and settle up with the fewest transfers")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or inspect trips.
    Trip(Trip),
    /// Manage the trip roster.
    Participant(Participant),
    /// Record and inspect expenses.
    Expense(Expense),
    /// Track installment payments.
    Installment(Installment),
    /// Net balance of every participant.
    Balances(ListArgs),
    /// Transfers that settle the trip.
    Settlements(SettlementsArgs),
    /// Mark a planned transfer as paid.
    Settle(SettleArgs),
    /// Shareable text with the pending transfers.
    Summary(TripRef),
}

/// Trip selector shared by the subcommands.
#[derive(Args, Debug)]
pub struct TripRef {
    /// Trip id (also read from `TRIPSPLIT_TRIP`).
    #[arg(long, env = "TRIPSPLIT_TRIP")]
    pub trip: Uuid,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub trip: TripRef,
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct Trip {
    #[command(subcommand)]
    pub command: TripCommand,
}

#[derive(Subcommand, Debug)]
pub enum TripCommand {
    /// Create a trip; the first member becomes its admin.
    New(TripNewArgs),
    Show(ListArgs),
}

#[derive(Args, Debug)]
pub struct TripNewArgs {
    pub name: String,
    /// Roster member name (repeatable).
    #[arg(long = "member", required = true)]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct Participant {
    #[command(subcommand)]
    pub command: ParticipantCommand,
}

#[derive(Subcommand, Debug)]
pub enum ParticipantCommand {
    /// Add someone who is not a registered user.
    Add(ParticipantArgs),
    /// Remove a participant no expense refers to.
    Remove(ParticipantArgs),
    /// Fold one participant into another.
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
pub struct ParticipantArgs {
    #[command(flatten)]
    pub trip: TripRef,
    /// Participant name or id.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub trip: TripRef,
    /// Participant to fold away (name or id).
    pub from: String,
    /// Participant that takes over (name or id).
    pub into: String,
}

#[derive(Args, Debug)]
pub struct Expense {
    #[command(subcommand)]
    pub command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    Add(ExpenseAddArgs),
    Delete(ExpenseRef),
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ExpenseAddArgs {
    #[command(flatten)]
    pub trip: TripRef,
    #[arg(long)]
    pub description: String,
    /// Total amount, e.g. `12.50`.
    #[arg(long)]
    pub amount: Money,
    /// Who paid (name or id).
    #[arg(long)]
    pub payer: String,
    /// Who shares the expense (repeatable, name or id).
    #[arg(long = "share")]
    pub sharers: Vec<String>,
    /// Share the expense with the whole roster.
    #[arg(long, conflicts_with = "sharers")]
    pub everyone: bool,
    #[arg(long, default_value = "other")]
    pub category: String,
    /// Number of installments; makes this an installment expense.
    #[arg(long, requires = "installment_amount", requires = "first_due")]
    pub installments: Option<u32>,
    /// Installments already paid.
    #[arg(long, default_value_t = 0, requires = "installments")]
    pub paid: u32,
    /// Amount of a single installment.
    #[arg(long, requires = "installments")]
    pub installment_amount: Option<Money>,
    /// Due date of the first installment (YYYY-MM-DD).
    #[arg(long, requires = "installments")]
    pub first_due: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct ExpenseRef {
    #[command(flatten)]
    pub trip: TripRef,
    pub expense: Uuid,
}

#[derive(Args, Debug)]
pub struct Installment {
    #[command(subcommand)]
    pub command: InstallmentCommand,
}

#[derive(Subcommand, Debug)]
pub enum InstallmentCommand {
    /// Record one more paid installment.
    Pay(ExpenseRef),
}

#[derive(Args, Debug)]
pub struct SettlementsArgs {
    #[command(flatten)]
    pub trip: TripRef,
    /// Include transfers already marked as paid.
    #[arg(long)]
    pub all: bool,
    /// Show the cash and installment breakdown of each transfer.
    #[arg(long)]
    pub breakdown: bool,
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SettleArgs {
    #[command(flatten)]
    pub trip: TripRef,
    pub transfer_id: String,
}
