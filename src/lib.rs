// BCC Inflation Dashboard - Core Library
// Exposes all modules for use in the CLI, the web server, and tests

pub mod blobs;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod import;
pub mod logging;
pub mod store;

#[cfg(feature = "server")]
pub mod routes;

// Re-export commonly used types
pub use blobs::{BlobStore, StoredBlob};
pub use config::{AppConfig, Page, RouteEntry};
pub use db::{Prediction, PredictionDraft, UploadedFile};
pub use error::{ConfigError, StoreError};
pub use forms::{
    validate_prediction, validate_upload, FilePayload, FormData, FormErrors, UploadDraft,
    ValidationError,
};
pub use import::{import_predictions, ImportReport, RejectedRow};
pub use store::{RecordStore, Repository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
