use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// RECORDS
// ============================================================================

/// A stored inflation prediction.
///
/// `created_at` is assigned once, at insert, and never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub year: i64,
    pub exchange_rate: f64,
    pub money_supply: f64,
    pub observed_inflation: Option<f64>,
    pub predicted_inflation: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.predicted_inflation {
            Some(p) => write!(f, "Prediction {} - {:.2}%", self.year, p),
            None => write!(f, "Prediction {} - n/a", self.year),
        }
    }
}

/// Validated prediction fields, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDraft {
    pub year: i64,
    pub exchange_rate: f64,
    pub money_supply: f64,
    pub observed_inflation: Option<f64>,
    pub predicted_inflation: Option<f64>,
}

/// An uploaded file row. The bytes live in the blob area at `file_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: i64,
    pub name: String,
    /// Path relative to the media root, e.g. `uploads/report.pdf`
    pub file_path: String,
    pub observation: String,
    pub size_bytes: i64,
    /// SHA-256 of the blob, hex encoded
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

impl std::fmt::Display for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Column values for a new `uploaded_files` row; the blob is already written.
#[derive(Debug, Clone)]
pub struct NewUploadRow<'a> {
    pub name: &'a str,
    pub file_path: &'a str,
    pub observation: &'a str,
    pub size_bytes: i64,
    pub sha256: &'a str,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL for file databases; in-memory ones report "memory" and keep it
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            exchange_rate REAL NOT NULL,
            money_supply REAL NOT NULL,
            observed_inflation REAL,
            predicted_inflation REAL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS uploaded_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) <= 100),
            file_path TEXT NOT NULL,
            observation TEXT NOT NULL DEFAULT '',
            size_bytes INTEGER NOT NULL,
            sha256 TEXT NOT NULL,
            uploaded_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_predictions_year ON predictions(year)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// PREDICTIONS
// ============================================================================

pub fn insert_prediction(
    conn: &Connection,
    draft: &PredictionDraft,
    created_at: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO predictions (
            year, exchange_rate, money_supply, observed_inflation, predicted_inflation, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            draft.year,
            draft.exchange_rate,
            draft.money_supply,
            draft.observed_inflation,
            draft.predicted_inflation,
            to_timestamp(created_at),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    Ok(Prediction {
        id: row.get(0)?,
        year: row.get(1)?,
        exchange_rate: row.get(2)?,
        money_supply: row.get(3)?,
        observed_inflation: row.get(4)?,
        predicted_inflation: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
    })
}

/// All predictions, newest first.
pub fn get_all_predictions(conn: &Connection) -> rusqlite::Result<Vec<Prediction>> {
    let mut stmt = conn.prepare(
        "SELECT id, year, exchange_rate, money_supply,
                observed_inflation, predicted_inflation, created_at
         FROM predictions
         ORDER BY created_at DESC, id DESC",
    )?;

    let predictions = stmt
        .query_map([], prediction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(predictions)
}

pub fn get_prediction(conn: &Connection, id: i64) -> rusqlite::Result<Option<Prediction>> {
    conn.query_row(
        "SELECT id, year, exchange_rate, money_supply,
                observed_inflation, predicted_inflation, created_at
         FROM predictions
         WHERE id = ?1",
        [id],
        prediction_from_row,
    )
    .optional()
}

pub fn count_predictions(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))
}

// ============================================================================
// UPLOADED FILES
// ============================================================================

pub fn insert_uploaded_file(
    conn: &Connection,
    row: &NewUploadRow<'_>,
    uploaded_at: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO uploaded_files (
            name, file_path, observation, size_bytes, sha256, uploaded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.name,
            row.file_path,
            row.observation,
            row.size_bytes,
            row.sha256,
            to_timestamp(uploaded_at),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

fn uploaded_file_from_row(row: &Row<'_>) -> rusqlite::Result<UploadedFile> {
    Ok(UploadedFile {
        id: row.get(0)?,
        name: row.get(1)?,
        file_path: row.get(2)?,
        observation: row.get(3)?,
        size_bytes: row.get(4)?,
        sha256: row.get(5)?,
        uploaded_at: parse_timestamp(row, 6)?,
    })
}

/// All uploaded files, newest first.
pub fn get_all_uploaded_files(conn: &Connection) -> rusqlite::Result<Vec<UploadedFile>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, file_path, observation, size_bytes, sha256, uploaded_at
         FROM uploaded_files
         ORDER BY uploaded_at DESC, id DESC",
    )?;

    let files = stmt
        .query_map([], uploaded_file_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(files)
}

pub fn get_uploaded_file(conn: &Connection, id: i64) -> rusqlite::Result<Option<UploadedFile>> {
    conn.query_row(
        "SELECT id, name, file_path, observation, size_bytes, sha256, uploaded_at
         FROM uploaded_files
         WHERE id = ?1",
        [id],
        uploaded_file_from_row,
    )
    .optional()
}

pub fn count_uploaded_files(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM uploaded_files", [], |row| row.get(0))
}

/// Current time at the precision the timestamp columns keep.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC text so that ORDER BY on the column is chronological.
fn to_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
