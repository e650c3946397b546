//! SQLite storage implementation

use crate::models::{Skill, Vacancy};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, VacancyStore};
use crate::storage::{RunRecord, RunStatus};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, query, source, status, vacancy_count";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_skills(&self, vacancy_row_id: i64) -> StorageResult<Vec<Skill>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM skills WHERE vacancy_id = ?1 ORDER BY position")?;

        let skills = stmt
            .query_map(params![vacancy_row_id], |row| row.get::<_, String>(0))?
            .map(|name| name.map(Skill::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(skills)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        query: row.get(3)?,
        source: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Failed),
        vacancy_count: row.get::<_, i64>(6)? as u64,
    })
}

/// Writes vacancies and their skills inside the caller's transaction
fn insert_vacancies(tx: &Transaction<'_>, run_id: i64, vacancies: &[Vacancy]) -> StorageResult<()> {
    let now = Utc::now().to_rfc3339();
    let mut insert_vacancy = tx.prepare(
        "INSERT INTO vacancies (internal_id, company, carrier_position, description, harvested_at, run_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut insert_skill =
        tx.prepare("INSERT INTO skills (vacancy_id, name, position) VALUES (?1, ?2, ?3)")?;

    for vacancy in vacancies {
        insert_vacancy
            .execute(params![
                vacancy.internal_id,
                vacancy.company,
                vacancy.carrier_position,
                vacancy.description,
                now,
                run_id
            ])
            .map_err(classify)?;
        let vacancy_row_id = tx.last_insert_rowid();

        for (position, skill) in vacancy.skills.iter().enumerate() {
            insert_skill
                .execute(params![vacancy_row_id, skill.name, position as i64])
                .map_err(classify)?;
        }
    }

    Ok(())
}

/// Surfaces UNIQUE and foreign key failures as constraint violations
fn classify(err: rusqlite::Error) -> StorageError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, ref message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(
                message.clone().unwrap_or_else(|| failure.to_string()),
            )
        }
        other => StorageError::Sqlite(other),
    }
}

impl VacancyStore for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, query: &str, source: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, query, source, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, query, source, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        vacancy_count: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, vacancy_count = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, vacancy_count as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Vacancies =====

    fn clear_vacancies(&mut self) -> StorageResult<()> {
        self.conn
            .execute_batch("DELETE FROM skills; DELETE FROM vacancies;")?;
        Ok(())
    }

    fn save_all(&mut self, run_id: i64, vacancies: &[Vacancy]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        insert_vacancies(&tx, run_id, vacancies)?;
        tx.commit()?;
        Ok(vacancies.len())
    }

    fn replace_all(&mut self, run_id: i64, vacancies: &[Vacancy]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM skills; DELETE FROM vacancies;")?;
        insert_vacancies(&tx, run_id, vacancies)?;
        tx.commit()?;
        Ok(vacancies.len())
    }

    fn load_vacancy(&self, internal_id: &str) -> StorageResult<Option<Vacancy>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, internal_id, company, carrier_position, description
                 FROM vacancies WHERE internal_id = ?1",
                params![internal_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        Vacancy {
                            internal_id: row.get(1)?,
                            company: row.get(2)?,
                            carrier_position: row.get(3)?,
                            description: row.get(4)?,
                            skills: Vec::new(),
                        },
                    ))
                },
            )
            .optional()?;

        match row {
            Some((row_id, mut vacancy)) => {
                vacancy.skills = self.load_skills(row_id)?;
                Ok(Some(vacancy))
            }
            None => Ok(None),
        }
    }

    // ===== Statistics =====

    fn count_vacancies(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vacancies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_skills(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(DISTINCT name) FROM skills", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, COUNT(*) AS uses FROM skills
             GROUP BY name ORDER BY uses DESC, name ASC LIMIT ?1",
        )?;

        let skills = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(skills)
    }
}
