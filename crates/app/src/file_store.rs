//! [`TripStore`] backed by one JSON document per trip.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use engine::{
    EngineError, Expense, ExpenseId, ResultEngine, SettledPayments, Trip, TripId, TripStore,
};
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};

#[derive(Debug, Serialize, Deserialize)]
struct TripDocument {
    trip: Trip,
    #[serde(default)]
    expenses: Vec<Expense>,
    #[serde(default)]
    settled: SettledPayments,
}

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Serialises read-modify-write cycles on the documents.
    lock: Mutex<()>,
}

fn storage(context: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::Storage(format!("{context}: {err}"))
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, trip_id: TripId) -> PathBuf {
        self.dir.join(format!("{trip_id}.json"))
    }

    async fn read(&self, trip_id: TripId) -> ResultEngine<Option<TripDocument>> {
        let path = self.path(trip_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(storage(&format!("read {}", path.display()), err)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|err| storage(&format!("parse {}", path.display()), err))
    }

    async fn require(&self, trip_id: TripId) -> ResultEngine<TripDocument> {
        self.read(trip_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("trip {trip_id}")))
    }

    /// Writes through a temporary file so a crash never leaves half a document.
    async fn write(&self, document: &TripDocument) -> ResultEngine<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| storage(&format!("create {}", self.dir.display()), err))?;
        let path = self.path(document.trip.id);
        let tmp = path.with_extension("json.tmp");
        let payload = serde_json::to_string_pretty(document)
            .map_err(|err| storage("serialize trip", err))?;
        fs::write(&tmp, payload)
            .await
            .map_err(|err| storage(&format!("write {}", tmp.display()), err))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|err| storage(&format!("rename {}", path.display()), err))
    }
}

impl TripStore for FileStore {
    async fn load_trip(&self, trip_id: TripId) -> ResultEngine<Trip> {
        Ok(self.require(trip_id).await?.trip)
    }

    async fn save_trip(&self, trip: &Trip) -> ResultEngine<Trip> {
        let _guard = self.lock.lock().await;
        let document = match self.read(trip.id).await? {
            Some(mut document) => {
                document.trip = trip.clone();
                document
            }
            None => TripDocument {
                trip: trip.clone(),
                expenses: Vec::new(),
                settled: SettledPayments::default(),
            },
        };
        self.write(&document).await?;
        Ok(document.trip)
    }

    async fn list_expenses(&self, trip_id: TripId) -> ResultEngine<Vec<Expense>> {
        Ok(self.require(trip_id).await?.expenses)
    }

    async fn create_expense(&self, expense: &Expense) -> ResultEngine<Expense> {
        let _guard = self.lock.lock().await;
        let mut document = self.require(expense.trip_id).await?;
        if document.expenses.iter().any(|e| e.id == expense.id) {
            return Err(EngineError::ExistingKey(expense.id.to_string()));
        }
        document.expenses.push(expense.clone());
        self.write(&document).await?;
        Ok(expense.clone())
    }

    async fn update_expense(&self, expense: &Expense) -> ResultEngine<Expense> {
        let _guard = self.lock.lock().await;
        let mut document = self.require(expense.trip_id).await?;
        let stored = document
            .expenses
            .iter_mut()
            .find(|e| e.id == expense.id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {}", expense.id)))?;
        *stored = expense.clone();
        self.write(&document).await?;
        Ok(expense.clone())
    }

    async fn delete_expense(&self, trip_id: TripId, expense_id: ExpenseId) -> ResultEngine<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.require(trip_id).await?;
        let before = document.expenses.len();
        document.expenses.retain(|e| e.id != expense_id);
        if document.expenses.len() == before {
            return Err(EngineError::KeyNotFound(format!("expense {expense_id}")));
        }
        self.write(&document).await
    }

    async fn load_settled(&self, trip_id: TripId) -> ResultEngine<SettledPayments> {
        Ok(self.require(trip_id).await?.settled)
    }

    async fn save_settled(&self, trip_id: TripId, settled: &SettledPayments) -> ResultEngine<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.require(trip_id).await?;
        document.settled = settled.clone();
        self.write(&document).await
    }
}
