// 🗄️ Record Store
// Owns the SQLite connection and the blob area; the only writer of records

use crate::blobs::BlobStore;
use crate::config::AppConfig;
use crate::db::{self, NewUploadRow, Prediction, PredictionDraft, UploadedFile};
use crate::error::StoreError;
use crate::forms::UploadDraft;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Save/list access to one record kind.
pub trait Repository {
    type Record;
    type Draft;

    /// Persist a validated draft. Assigns the id and the creation timestamp.
    fn save(&self, draft: Self::Draft) -> Result<Self::Record, StoreError>;

    /// All records, newest first.
    fn list(&self) -> Result<Vec<Self::Record>, StoreError>;

    fn count(&self) -> Result<i64, StoreError>;
}

pub struct RecordStore {
    conn: Mutex<Connection>,
    blobs: BlobStore,
}

impl RecordStore {
    /// Open the database and blob area named by the config.
    pub fn open(config: &AppConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.database_path)?;
        let blobs = BlobStore::new(&config.media_root, &config.upload_to);
        Self::with_connection(conn, blobs)
    }

    pub fn open_in_memory(blobs: BlobStore) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, blobs)
    }

    pub fn with_connection(conn: Connection, blobs: BlobStore) -> Result<Self, StoreError> {
        db::setup_database(&conn)?;
        blobs
            .ensure_dirs()
            .map_err(|source| StoreError::BlobWrite {
                path: blobs.upload_dir(),
                source,
            })?;

        Ok(RecordStore {
            conn: Mutex::new(conn),
            blobs,
        })
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn predictions(&self) -> Predictions<'_> {
        Predictions { store: self }
    }

    pub fn uploads(&self) -> Uploads<'_> {
        Uploads { store: self }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::unavailable("database connection lock poisoned"))
    }
}

// ============================================================================
// PREDICTIONS
// ============================================================================

pub struct Predictions<'a> {
    store: &'a RecordStore,
}

impl Repository for Predictions<'_> {
    type Record = Prediction;
    type Draft = PredictionDraft;

    fn save(&self, draft: PredictionDraft) -> Result<Prediction, StoreError> {
        let created_at = db::now();
        let conn = self.store.conn()?;

        let id = db::insert_prediction(&conn, &draft, created_at).map_err(|e| {
            tracing::error!(error = %e, "failed to insert prediction");
            StoreError::from(e)
        })?;

        tracing::info!(id, year = draft.year, "prediction saved");

        Ok(Prediction {
            id,
            year: draft.year,
            exchange_rate: draft.exchange_rate,
            money_supply: draft.money_supply,
            observed_inflation: draft.observed_inflation,
            predicted_inflation: draft.predicted_inflation,
            created_at,
        })
    }

    fn list(&self) -> Result<Vec<Prediction>, StoreError> {
        let conn = self.store.conn()?;
        Ok(db::get_all_predictions(&conn)?)
    }

    fn count(&self) -> Result<i64, StoreError> {
        let conn = self.store.conn()?;
        Ok(db::count_predictions(&conn)?)
    }
}

impl Predictions<'_> {
    pub fn get(&self, id: i64) -> Result<Option<Prediction>, StoreError> {
        let conn = self.store.conn()?;
        Ok(db::get_prediction(&conn, id)?)
    }
}

// ============================================================================
// UPLOADED FILES
// ============================================================================

pub struct Uploads<'a> {
    store: &'a RecordStore,
}

impl Repository for Uploads<'_> {
    type Record = UploadedFile;
    type Draft = UploadDraft;

    /// Blob first, then the row. A failed insert removes the blob again.
    fn save(&self, draft: UploadDraft) -> Result<UploadedFile, StoreError> {
        // Take the lock before touching the disk so an unusable store fails fast
        let conn = self.store.conn()?;

        let blob = self
            .store
            .blobs
            .write(&draft.file.filename, &draft.file.bytes)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to write upload blob");
                e
            })?;

        let uploaded_at = db::now();
        let row = NewUploadRow {
            name: &draft.name,
            file_path: &blob.relative_path,
            observation: &draft.observation,
            size_bytes: blob.size_bytes,
            sha256: &blob.sha256,
        };

        let id = match db::insert_uploaded_file(&conn, &row, uploaded_at) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, path = %blob.relative_path, "failed to insert upload row");
                if let Err(cleanup) = self.store.blobs.remove(&blob.relative_path) {
                    tracing::warn!(error = %cleanup, path = %blob.relative_path, "orphaned blob left behind");
                }
                return Err(e.into());
            }
        };

        tracing::info!(id, name = %draft.name, path = %blob.relative_path, "upload saved");

        Ok(UploadedFile {
            id,
            name: draft.name,
            file_path: blob.relative_path,
            observation: draft.observation,
            size_bytes: blob.size_bytes,
            sha256: blob.sha256,
            uploaded_at,
        })
    }

    fn list(&self) -> Result<Vec<UploadedFile>, StoreError> {
        let conn = self.store.conn()?;
        Ok(db::get_all_uploaded_files(&conn)?)
    }

    fn count(&self) -> Result<i64, StoreError> {
        let conn = self.store.conn()?;
        Ok(db::count_uploaded_files(&conn)?)
    }
}

impl Uploads<'_> {
    pub fn get(&self, id: i64) -> Result<Option<UploadedFile>, StoreError> {
        let conn = self.store.conn()?;
        Ok(db::get_uploaded_file(&conn, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FilePayload;
    use tempfile::TempDir;

    fn test_store() -> (RecordStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open_in_memory(BlobStore::new(dir.path(), "uploads")).unwrap();
        (store, dir)
    }

    fn draft(year: i64) -> PredictionDraft {
        PredictionDraft {
            year,
            exchange_rate: 2700.0,
            money_supply: 9_800.5,
            observed_inflation: None,
            predicted_inflation: Some(11.0),
        }
    }

    fn upload(name: &str, filename: &str) -> UploadDraft {
        UploadDraft {
            name: name.to_string(),
            observation: "quarterly".to_string(),
            file: FilePayload::new(filename, b"col_a,col_b\n1,2\n".to_vec()),
        }
    }

    #[test]
    fn test_save_then_read_prediction() {
        let (store, _dir) = test_store();

        let saved = store.predictions().save(draft(2022)).unwrap();
        let read = store.predictions().get(saved.id).unwrap().unwrap();

        assert_eq!(read.year, 2022);
        assert_eq!(read.exchange_rate, 2700.0);
        assert_eq!(read.money_supply, 9_800.5);
        assert_eq!(read.predicted_inflation, Some(11.0));
        assert_eq!(read.created_at, saved.created_at);
    }

    #[test]
    fn test_same_draft_twice_makes_two_records() {
        let (store, _dir) = test_store();

        let a = store.predictions().save(draft(2022)).unwrap();
        let b = store.predictions().save(draft(2022)).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.predictions().count().unwrap(), 2);
        assert_eq!(store.predictions().list().unwrap().len(), 2);
    }

    #[test]
    fn test_save_upload_writes_blob_and_row() {
        let (store, dir) = test_store();

        let saved = store.uploads().save(upload("report", "report.csv")).unwrap();

        assert_eq!(saved.name, "report");
        assert_eq!(saved.file_path, "uploads/report.csv");
        assert_eq!(saved.observation, "quarterly");
        assert!(dir.path().join("uploads").join("report.csv").exists());

        let listed = store.uploads().list().unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[test]
    fn test_failed_insert_removes_blob() {
        let (store, dir) = test_store();

        // The table rejects names over 100 chars, after the blob is written
        let bad = upload(&"n".repeat(150), "orphan.csv");
        let result = store.uploads().save(bad);

        assert!(matches!(result, Err(StoreError::StorageUnavailable { .. })));
        assert_eq!(store.uploads().count().unwrap(), 0);
        assert!(!dir.path().join("uploads").join("orphan.csv").exists());
    }

    #[test]
    fn test_failed_blob_write_creates_no_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open_in_memory(BlobStore::new(dir.path(), "uploads")).unwrap();

        // Replace the upload directory with a plain file
        std::fs::remove_dir(dir.path().join("uploads")).unwrap();
        std::fs::write(dir.path().join("uploads"), b"blocked").unwrap();

        let result = store.uploads().save(upload("report", "report.csv"));

        assert!(matches!(result, Err(StoreError::BlobWrite { .. })));
        assert_eq!(store.uploads().count().unwrap(), 0);
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("bcc.db"),
            media_root: dir.path().join("media"),
            ..AppConfig::default()
        };

        let store = RecordStore::open(&config).unwrap();
        store.predictions().save(draft(2018)).unwrap();
        drop(store);

        let reopened = RecordStore::open(&config).unwrap();
        assert_eq!(reopened.predictions().count().unwrap(), 1);
        assert!(config.upload_dir().is_dir());
    }
}
