use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

use crate::models::{EmployerVacancyCount, VacancyListing};

/// Per-vacancy salary used for averaging: the mean of both bounds when both
/// are set, otherwise whichever bound is set. Integer arithmetic throughout.
const REPRESENTATIVE_SALARY: &str = "
    CASE
        WHEN v.salary_from IS NOT NULL AND v.salary_to IS NOT NULL THEN (v.salary_from + v.salary_to) / 2
        WHEN v.salary_from IS NOT NULL THEN v.salary_from
        WHEN v.salary_to IS NOT NULL THEN v.salary_to
        ELSE 0
    END";

const LISTING_COLUMNS: &str =
    "e.name, v.title, v.salary_from, v.salary_to, v.salary_currency, v.url";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database file and its parent directory.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS employers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hh_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                url TEXT
            );

            CREATE TABLE IF NOT EXISTS vacancies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hh_id TEXT NOT NULL UNIQUE,
                employer_id INTEGER REFERENCES employers(id),
                title TEXT NOT NULL,
                salary_from INTEGER,
                salary_to INTEGER,
                salary_currency TEXT,
                url TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_vacancies_employer ON vacancies(employer_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('employers', 'vacancies')",
            [],
            |row| row.get(0),
        )?;
        if tables < 2 {
            return Err(anyhow!(
                "Database not initialized. Run 'hh-vacancies init' first."
            ));
        }
        Ok(())
    }

    // --- Employer operations ---

    /// Returns the surrogate key for `hh_id`, inserting the employer first if
    /// it is not stored yet. An existing row is never modified.
    pub fn upsert_employer(&self, hh_id: &str, name: &str, url: Option<&str>) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO employers (hh_id, name, url) VALUES (?1, ?2, ?3)
             ON CONFLICT(hh_id) DO NOTHING",
            params![hh_id, name, url],
        )?;
        let id: i64 = tx.query_row(
            "SELECT id FROM employers WHERE hh_id = ?1",
            [hh_id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        if inserted > 0 {
            debug!(%hh_id, id, "inserted employer");
        }
        Ok(id)
    }

    pub fn employer_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM employers", [], |row| row.get(0))?)
    }

    // --- Vacancy operations ---

    /// Inserts the vacancy unless one with the same `hh_id` exists. Returns
    /// whether a row was written.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_vacancy_if_absent(
        &self,
        hh_id: &str,
        employer_id: i64,
        title: &str,
        salary_from: Option<i64>,
        salary_to: Option<i64>,
        salary_currency: Option<&str>,
        url: Option<&str>,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO vacancies (hh_id, employer_id, title, salary_from, salary_to, salary_currency, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(hh_id) DO NOTHING",
            params![hh_id, employer_id, title, salary_from, salary_to, salary_currency, url],
        )?;
        Ok(inserted > 0)
    }

    pub fn vacancy_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM vacancies", [], |row| row.get(0))?)
    }

    // --- Aggregates ---

    /// Vacancy count per employer name, busiest first. Employers sharing a
    /// name are reported as one row.
    pub fn count_vacancies_per_employer(&self) -> Result<Vec<EmployerVacancyCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.name, COUNT(v.id)
             FROM employers e
             LEFT JOIN vacancies v ON e.id = v.employer_id
             GROUP BY e.name
             ORDER BY COUNT(v.id) DESC, e.name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EmployerVacancyCount {
                employer_name: row.get(0)?,
                vacancies: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to count vacancies per employer")
    }

    pub fn list_all_vacancies(&self) -> Result<Vec<VacancyListing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS}
             FROM vacancies v
             JOIN employers e ON v.employer_id = e.id
             ORDER BY e.name, v.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_listing)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list vacancies")
    }

    /// Mean representative salary over vacancies that carry at least one
    /// bound. `None` when no vacancy has salary data.
    pub fn average_salary(&self) -> Result<Option<f64>> {
        let sql = format!(
            "SELECT AVG({REPRESENTATIVE_SALARY})
             FROM vacancies v
             WHERE v.salary_from IS NOT NULL OR v.salary_to IS NOT NULL"
        );
        let avg: Option<f64> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(avg)
    }

    /// Vacancies whose representative salary is strictly above the average.
    /// Vacancies without any bound count as 0 here.
    pub fn list_above_average_salary(&self) -> Result<Vec<VacancyListing>> {
        let Some(avg) = self.average_salary()? else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT {LISTING_COLUMNS}
             FROM vacancies v
             JOIN employers e ON v.employer_id = e.id
             WHERE ({REPRESENTATIVE_SALARY}) > ?1
             ORDER BY e.name, v.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([avg], Self::row_to_listing)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list above-average vacancies")
    }

    fn row_to_listing(row: &rusqlite::Row) -> rusqlite::Result<VacancyListing> {
        Ok(VacancyListing {
            employer_name: row.get(0)?,
            title: row.get(1)?,
            salary_from: row.get(2)?,
            salary_to: row.get(3)?,
            salary_currency: row.get(4)?,
            url: row.get(5)?,
        })
    }
}
