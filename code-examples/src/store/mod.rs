use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_std::task::sleep;
use rand::{Rng, rng};
use thiserror::Error;

/// Failures a managed Postgres connection can surface to a route handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    #[error("connection terminated unexpectedly")]
    ConnectionDropped,
    #[error("canceling statement due to statement timeout")]
    StatementTimeout,
    #[error("duplicate key value violates unique constraint \"{0}\"")]
    UniqueViolation(String),
}

impl DbError {
    /// Connection-level failures are worth another attempt; constraint
    /// violations will fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::ConnectionDropped | DbError::StatementTimeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: u32,
    pub name: String,
    pub cluster: String,
}

#[derive(Default)]
struct Tables {
    participants: BTreeMap<u32, Participant>,
    trainings: BTreeMap<String, u32>,
}

/// In-memory stand-in for the dashboard database that drops a share of calls.
#[derive(Clone)]
pub struct FlakyStore {
    tables: Arc<Mutex<Tables>>,
    failure_rate: f64,
    latency: Duration,
}

impl FlakyStore {
    pub fn new(failure_rate: f64) -> Self {
        let mut tables = Tables::default();
        for (id, name, cluster) in [
            (1, "Amina", "North"),
            (2, "Brian", "North"),
            (3, "Chloe", "Lakeside"),
            (4, "Dawit", "Lakeside"),
        ] {
            tables.participants.insert(
                id,
                Participant {
                    id,
                    name: name.to_string(),
                    cluster: cluster.to_string(),
                },
            );
        }

        FlakyStore {
            tables: Arc::new(Mutex::new(tables)),
            failure_rate,
            latency: Duration::from_millis(20),
        }
    }

    fn roll(&self) -> Result<(), DbError> {
        let mut rng = rng();
        if rng.random_bool(self.failure_rate) {
            if rng.random_bool(0.5) {
                Err(DbError::ConnectionDropped)
            } else {
                Err(DbError::StatementTimeout)
            }
        } else {
            Ok(())
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DbError> {
        self.tables.lock().map_err(|_| DbError::ConnectionDropped)
    }

    pub async fn participants_in_cluster(&self, cluster: &str) -> Result<Vec<Participant>, DbError> {
        sleep(self.latency).await;
        self.roll()?;
        let tables = self.tables()?;
        Ok(tables
            .participants
            .values()
            .filter(|p| p.cluster == cluster)
            .cloned()
            .collect())
    }

    /// Idempotent: re-running it with the same key leaves one row.
    pub async fn upsert_training(&self, title: &str, attendees: u32) -> Result<(), DbError> {
        sleep(self.latency).await;
        self.roll()?;
        self.tables()?.trainings.insert(title.to_string(), attendees);
        Ok(())
    }

    /// Not idempotent: a second insert with the same title is rejected.
    pub fn insert_training(&self, title: &str, attendees: u32) -> Result<(), DbError> {
        let mut tables = self.tables()?;
        if tables.trainings.contains_key(title) {
            return Err(DbError::UniqueViolation("trainings_title_key".to_string()));
        }
        tables.trainings.insert(title.to_string(), attendees);
        Ok(())
    }

    pub fn count_participants(&self) -> Result<usize, DbError> {
        std::thread::sleep(self.latency);
        self.roll()?;
        Ok(self.tables()?.participants.len())
    }

    pub fn training_count(&self) -> usize {
        self.tables().map(|t| t.trainings.len()).unwrap_or_default()
    }
}
