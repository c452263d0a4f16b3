// ⚙️ Application configuration
// One explicit struct, loaded once at startup and passed down

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "bcc.toml";
pub const DEFAULT_DB_FILENAME: &str = "bcc.db";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_UPLOAD_TO: &str = "uploads";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// ROUTE TABLE
// ============================================================================

/// The pages the web application knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Home,
    Dashboard,
    Explorer,
    Prediction,
    Upload,
}

impl Page {
    pub fn default_path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Dashboard => "/dashboard/",
            Page::Explorer => "/explorer/",
            Page::Prediction => "/prediction/",
            Page::Upload => "/upload/",
        }
    }

    pub fn all() -> [Page; 5] {
        [
            Page::Home,
            Page::Dashboard,
            Page::Explorer,
            Page::Prediction,
            Page::Upload,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub page: Page,
    pub path: String,
}

impl RouteEntry {
    pub fn new(page: Page, path: impl Into<String>) -> Self {
        RouteEntry {
            page,
            path: path.into(),
        }
    }
}

fn default_routes() -> Vec<RouteEntry> {
    Page::all()
        .iter()
        .map(|page| RouteEntry::new(*page, page.default_path()))
        .collect()
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// Root directory for uploaded blobs (also served under `/media`).
    pub media_root: PathBuf,
    /// Subdirectory of `media_root` that receives uploads.
    pub upload_to: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
    /// Registered page routes.
    pub routes: Vec<RouteEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from(DEFAULT_DB_FILENAME),
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            upload_to: DEFAULT_UPLOAD_TO.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            routes: default_routes(),
        }
    }
}

impl AppConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load the startup config.
    ///
    /// `BCC_CONFIG` names the file; otherwise `bcc.toml` is used when it
    /// exists, else the defaults. `BCC_DATABASE`, `BCC_MEDIA_ROOT` and
    /// `BCC_BIND` override the file.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("BCC_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => AppConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("BCC_DATABASE") {
            self.database_path = PathBuf::from(db);
        }
        if let Some(root) = lookup("BCC_MEDIA_ROOT") {
            self.media_root = PathBuf::from(root);
        }
        if let Some(bind) = lookup("BCC_BIND") {
            self.bind_addr = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_to.is_empty()
            || self.upload_to.starts_with('/')
            || self.upload_to.split('/').any(|part| part == "..")
        {
            return Err(ConfigError::Invalid {
                field: "upload_to".to_string(),
                message: format!("must be a relative directory name, got {:?}", self.upload_to),
            });
        }

        let mut seen = HashSet::new();
        for entry in &self.routes {
            if !entry.path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "routes".to_string(),
                    message: format!("path {:?} must start with '/'", entry.path),
                });
            }
            if !seen.insert(entry.path.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "routes".to_string(),
                    message: format!("path {:?} is registered twice", entry.path),
                });
            }
        }

        // A successful upload redirects to the dashboard
        if self.path_for(Page::Upload).is_some() && self.path_for(Page::Dashboard).is_none() {
            return Err(ConfigError::Invalid {
                field: "routes".to_string(),
                message: "the upload page needs a dashboard route to redirect to".to_string(),
            });
        }

        Ok(())
    }

    /// Path registered for a page, if the page is routed at all.
    pub fn path_for(&self, page: Page) -> Option<&str> {
        self.routes
            .iter()
            .find(|entry| entry.page == page)
            .map(|entry| entry.path.as_str())
    }

    /// Absolute-ish directory uploads are written into.
    pub fn upload_dir(&self) -> PathBuf {
        self.media_root.join(&self.upload_to)
    }
}
