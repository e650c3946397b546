//! Storage traits and error types

use crate::models::Vacancy;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence sink for harvested vacancies
///
/// The pipeline never calls into this; the binary drains a run's stream and
/// hands the records over in one batch.
pub trait VacancyStore {
    // ===== Run Management =====

    /// Records the start of a run and returns its ID
    fn create_run(&mut self, query: &str, source: &str) -> StorageResult<i64>;

    /// Stamps the finish time, final status and number of stored vacancies
    fn finish_run(&mut self, run_id: i64, status: RunStatus, vacancy_count: u64)
        -> StorageResult<()>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Vacancies =====

    /// Removes every stored vacancy and its skills
    fn clear_vacancies(&mut self) -> StorageResult<()>;

    /// Stores all vacancies of a run in a single transaction
    ///
    /// Either every vacancy is written or none is.
    fn save_all(&mut self, run_id: i64, vacancies: &[Vacancy]) -> StorageResult<usize>;

    /// Replaces the stored vacancy set with a run's vacancies
    ///
    /// Deleting the old set and writing the new one share a transaction, so
    /// a failed write leaves the previous set in place.
    fn replace_all(&mut self, run_id: i64, vacancies: &[Vacancy]) -> StorageResult<usize>;

    /// Loads one vacancy with its skills in stored order
    fn load_vacancy(&self, internal_id: &str) -> StorageResult<Option<Vacancy>>;

    // ===== Statistics =====

    fn count_vacancies(&self) -> StorageResult<u64>;

    fn count_skills(&self) -> StorageResult<u64>;

    /// Most frequent skill names, most frequent first
    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}
