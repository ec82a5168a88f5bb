use api_types::{expense::ExpenseCreated, settlement::SettlementsResponse};
use engine::{
    Category, Engine, ExpenseDraft, ExpenseId, Installment, MarkOutcome, Money,
    Participant, ParticipantId, Role, SettledStatus, TransferId, Trip, TripId, TripStore,
};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    cli::{
        Command, ExpenseAddArgs, ExpenseCommand, InstallmentCommand, ParticipantCommand,
        SettlementsArgs, TripCommand,
    },
    error::{AppError, Result},
    views,
};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Finds a roster member by id or, failing that, by name.
fn resolve(trip: &Trip, raw: &str) -> Result<ParticipantId> {
    let raw = raw.trim();
    if let Ok(uuid) = raw.parse::<Uuid>()
        && trip.participant(ParticipantId(uuid)).is_some()
    {
        return Ok(ParticipantId(uuid));
    }
    trip.participant_by_name(raw)
        .map(|p| p.id)
        .ok_or_else(|| AppError::Input(format!("no participant named {raw} in {}", trip.name)))
}

fn draft(trip: &Trip, args: ExpenseAddArgs) -> Result<ExpenseDraft> {
    let payer = resolve(trip, &args.payer)?;
    let sharers: Vec<ParticipantId> = if args.everyone {
        trip.participants.iter().map(|p| p.id).collect()
    } else {
        args.sharers
            .iter()
            .map(|raw| resolve(trip, raw))
            .collect::<Result<_>>()?
    };
    if sharers.is_empty() {
        warn!(expense = %args.description, "expense has no sharers and creates no debt");
    }

    let mut draft = ExpenseDraft::new(args.description)
        .amount(args.amount)
        .payer(payer)
        .shared_with(sharers)
        .category(Category::try_from(args.category.as_str())?);

    if let (Some(total), Some(amount), Some(first_due)) =
        (args.installments, args.installment_amount, args.first_due)
    {
        draft = draft.installment(Installment::new(total, first_due, amount).paid(args.paid));
    }
    Ok(draft)
}

pub async fn run<S: TripStore>(engine: &mut Engine<S>, command: Command) -> Result<()> {
    match command {
        Command::Trip(trip) => match trip.command {
            TripCommand::New(args) => {
                let members = args
                    .members
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        let role = if idx == 0 { Role::Admin } else { Role::Member };
                        Participant::new(name.as_str(), role)
                    })
                    .collect();
                let trip_id = engine.create_trip(&args.name, members).await?;
                println!("{trip_id}");
            }
            TripCommand::Show(args) => {
                let state = engine.open_trip(TripId(args.trip.trip)).await?;
                let view = views::trip_view(state);
                if args.json {
                    return print_json(&view);
                }
                println!("{} ({})", view.name, view.id);
                for participant in &view.participants {
                    let external = if participant.external { ", external" } else { "" };
                    println!("  {} [{}{external}] {}", participant.name, participant.role, participant.id);
                }
                println!(
                    "{} expenses, {} spent",
                    view.expense_count,
                    Money::new(view.total_spent_minor)
                );
            }
        },
        Command::Participant(participant) => match participant.command {
            ParticipantCommand::Add(args) => {
                let trip_id = TripId(args.trip.trip);
                engine.open_trip(trip_id).await?;
                let id = engine.add_external_participant(trip_id, &args.name).await?;
                println!("{id}");
            }
            ParticipantCommand::Remove(args) => {
                let trip_id = TripId(args.trip.trip);
                let state = engine.open_trip(trip_id).await?;
                let id = resolve(&state.trip, &args.name)?;
                engine.remove_participant(trip_id, id).await?;
                println!("removed {}", args.name);
            }
            ParticipantCommand::Merge(args) => {
                let trip_id = TripId(args.trip.trip);
                let state = engine.open_trip(trip_id).await?;
                let from = resolve(&state.trip, &args.from)?;
                let into = resolve(&state.trip, &args.into)?;
                let rewritten = engine.merge_participant(trip_id, from, into).await?;
                println!("merged {} into {} ({rewritten} expenses rewritten)", args.from, args.into);
            }
        },
        Command::Expense(expense) => match expense.command {
            ExpenseCommand::Add(args) => {
                let trip_id = TripId(args.trip.trip);
                let state = engine.open_trip(trip_id).await?;
                let draft = draft(&state.trip, args)?;
                let id = engine.add_expense(trip_id, draft).await?;
                print_json(&ExpenseCreated { id: id.0 })?;
            }
            ExpenseCommand::Delete(args) => {
                let trip_id = TripId(args.trip.trip);
                engine.open_trip(trip_id).await?;
                engine.delete_expense(trip_id, ExpenseId(args.expense)).await?;
                println!("deleted {}", args.expense);
            }
            ExpenseCommand::List(args) => {
                let state = engine.open_trip(TripId(args.trip.trip)).await?;
                let expenses: Vec<_> = state
                    .expenses
                    .iter()
                    .map(|e| views::expense_view(&state.trip, e))
                    .collect();
                if args.json {
                    return print_json(&expenses);
                }
                for (expense, view) in state.expenses.iter().zip(&expenses) {
                    let progress = expense
                        .installment
                        .as_ref()
                        .map(|i| format!(" ({}/{} paid)", i.paid, i.total))
                        .unwrap_or_default();
                    println!(
                        "{}  {}: {} paid by {} for {}{progress}",
                        view.id,
                        view.description,
                        expense.amount,
                        view.payer,
                        view.participants.join(", ")
                    );
                }
            }
        },
        Command::Installment(installment) => match installment.command {
            InstallmentCommand::Pay(args) => {
                let trip_id = TripId(args.trip.trip);
                engine.open_trip(trip_id).await?;
                let installment = engine
                    .advance_installment(trip_id, ExpenseId(args.expense))
                    .await?;
                match installment.next_due_date() {
                    Some(due) => println!("{}/{} paid, next due {due}", installment.paid, installment.total),
                    None => println!("{}/{} paid, schedule complete", installment.paid, installment.total),
                }
            }
        },
        Command::Balances(args) => {
            let trip_id = TripId(args.trip.trip);
            engine.open_trip(trip_id).await?;
            let balances = engine.balances(trip_id)?;
            let trip = &engine.trip(trip_id)?.trip;
            let rows: Vec<_> = balances
                .iter()
                .map(|b| views::balance_view(trip, b))
                .collect();
            if args.json {
                return print_json(&rows);
            }
            for balance in balances.iter() {
                println!("{:>10}  {}", balance.amount, trip.display_name(balance.participant));
            }
        }
        Command::Settlements(args) => settlements(engine, args).await?,
        Command::Settle(args) => {
            let trip_id = TripId(args.trip.trip);
            engine.open_trip(trip_id).await?;
            let transfer_id = TransferId::from(args.transfer_id.as_str());
            match engine.mark_settled(trip_id, &transfer_id).await? {
                MarkOutcome::Marked => println!("settled {transfer_id}"),
                MarkOutcome::AlreadySettled => println!("{transfer_id} was already settled"),
                MarkOutcome::Stale => {
                    return Err(AppError::Input(format!(
                        "no planned transfer matches {transfer_id}"
                    )));
                }
            }
        }
        Command::Summary(args) => {
            let trip_id = TripId(args.trip);
            engine.open_trip(trip_id).await?;
            print!("{}", engine.share_message(trip_id)?);
        }
    }
    Ok(())
}

async fn settlements<S: TripStore>(engine: &mut Engine<S>, args: SettlementsArgs) -> Result<()> {
    let trip_id = TripId(args.trip.trip);
    engine.open_trip(trip_id).await?;
    let plan = engine.settlement_plan(trip_id)?;
    let planned: Vec<_> = engine
        .settlements(trip_id)?
        .into_iter()
        .filter(|p| args.all || p.status != SettledStatus::Settled)
        .collect();
    debug!(trip = %trip_id, shown = planned.len(), "listing settlements");
    let trip = &engine.trip(trip_id)?.trip;

    if args.json {
        return print_json(&SettlementsResponse {
            settlements: planned
                .iter()
                .map(|p| views::settlement_view(trip, p, args.breakdown))
                .collect(),
            unresolved: plan
                .unresolved
                .iter()
                .map(|b| views::balance_view(trip, b))
                .collect(),
        });
    }

    if planned.is_empty() {
        println!("Nothing to settle.");
    }
    for p in &planned {
        let status = match p.status {
            SettledStatus::Pending => "",
            SettledStatus::Settled => " [settled]",
            SettledStatus::Stale => " [amount changed since it was settled]",
        };
        println!(
            "{} -> {}: {}{status}\n  id: {}",
            trip.display_name(p.transfer.from),
            trip.display_name(p.transfer.to),
            p.transfer.amount,
            p.transfer.id
        );
        if args.breakdown {
            println!("  cash: {}", p.breakdown.cash_total);
            println!("  installments: {}", p.breakdown.installment_total);
            for line in &p.breakdown.installments {
                println!(
                    "  - {}: {}/{} paid, {} per installment",
                    line.description, line.paid, line.total, line.per_person_amount
                );
            }
        }
    }
    for balance in &plan.unresolved {
        println!(
            "unresolved: {} {}",
            trip.display_name(balance.participant),
            balance.amount
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use engine::{MemoryStore, Money};

    use super::*;
    use crate::cli::Cli;

    async fn engine_with_trip() -> (Engine<MemoryStore>, TripId) {
        let mut engine = Engine::builder().store(MemoryStore::new()).build().unwrap();
        let trip_id = engine
            .create_trip(
                "Porto",
                vec![
                    Participant::new("Alice", Role::Admin),
                    Participant::new("Bob", Role::Member),
                ],
            )
            .await
            .unwrap();
        (engine, trip_id)
    }

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("tripsplit").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[tokio::test]
    async fn expense_add_resolves_names() {
        let (mut engine, trip_id) = engine_with_trip().await;
        let trip = trip_id.to_string();
        let command = parse(&[
            "expense", "add", "--trip", &trip, "--description", "Dinner", "--amount", "30",
            "--payer", "alice", "--everyone",
        ]);
        run(&mut engine, command).await.unwrap();

        let balances = engine.balances(trip_id).unwrap();
        assert_eq!(balances.total(), Money::ZERO);
        assert_eq!(balances.iter().next().map(|b| b.amount), Some(Money::new(15_00)));
    }

    #[tokio::test]
    async fn settle_rejects_unknown_transfer() {
        let (mut engine, trip_id) = engine_with_trip().await;
        let trip = trip_id.to_string();
        let command = parse(&["settle", "--trip", &trip, "nobody:nowhere:0"]);
        let err = run(&mut engine, command).await.unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[tokio::test]
    async fn unknown_participant_is_reported() {
        let (mut engine, trip_id) = engine_with_trip().await;
        let trip = trip_id.to_string();
        let command = parse(&["participant", "remove", "--trip", &trip, "Carol"]);
        let err = run(&mut engine, command).await.unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }
}
