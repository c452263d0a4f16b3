// ⚠️ Error types shared by the store, the config loader and the web layer

use std::path::PathBuf;

/// Storage-layer errors (SQLite rows and blob files).
///
/// Both variants are fatal to the request that triggered them; no retry is
/// attempted and no partial record is left behind.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("failed to write blob {}: {source}", .path.display())]
    BlobWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::StorageUnavailable {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::unavailable(err.to_string())
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {message}")]
    Invalid { field: String, message: String },
}
