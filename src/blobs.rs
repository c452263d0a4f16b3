// 📦 Blob area - uploaded file bytes on disk
//
// Rows in `uploaded_files` only hold a path relative to the media root.
// Stored names are derived from the original filename; a collision gets a
// short random suffix instead of overwriting.

use crate::error::StoreError;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const MAX_STEM_CHARS: usize = 80;
const MAX_EXT_CHARS: usize = 16;
const MAX_NAME_ATTEMPTS: usize = 16;

/// A blob that has been written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    /// Path relative to the media root, always `/`-separated
    pub relative_path: String,
    pub size_bytes: i64,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    media_root: PathBuf,
    upload_to: String,
}

impl BlobStore {
    pub fn new(media_root: impl Into<PathBuf>, upload_to: impl Into<String>) -> Self {
        BlobStore {
            media_root: media_root.into(),
            upload_to: upload_to.into(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.media_root.join(&self.upload_to)
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.upload_dir())
    }

    /// Resolve a stored relative path against the media root.
    pub fn absolute(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.media_root.clone(), |path, part| path.join(part))
    }

    /// Write `bytes` under the upload directory, named after `original_name`.
    ///
    /// The file is created with `create_new`, so concurrent uploads with the
    /// same name never clobber each other. A failed write removes the partial
    /// file.
    pub fn write(&self, original_name: &str, bytes: &[u8]) -> Result<StoredBlob, StoreError> {
        let dir = self.upload_dir();
        fs::create_dir_all(&dir).map_err(|source| StoreError::BlobWrite {
            path: dir.clone(),
            source,
        })?;

        let base = sanitize_filename(original_name);
        let mut candidate = base.clone();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(source) = file.write_all(bytes).and_then(|_| file.sync_all()) {
                        drop(file);
                        if let Err(cleanup) = fs::remove_file(&path) {
                            tracing::warn!(error = %cleanup, path = %path.display(), "partial blob left behind");
                        }
                        return Err(StoreError::BlobWrite { path, source });
                    }

                    tracing::debug!(path = %path.display(), size = bytes.len(), "blob written");

                    return Ok(StoredBlob {
                        relative_path: format!("{}/{}", self.upload_to, candidate),
                        size_bytes: bytes.len() as i64,
                        sha256: sha256_hex(bytes),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    candidate = with_random_suffix(&base);
                }
                Err(source) => return Err(StoreError::BlobWrite { path, source }),
            }
        }

        Err(StoreError::BlobWrite {
            path: dir.join(&base),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no free name for upload after repeated attempts",
            ),
        })
    }

    pub fn remove(&self, relative: &str) -> io::Result<()> {
        fs::remove_file(self.absolute(relative))
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Reduce an uploaded filename to a safe basename.
///
/// Directory components are dropped, whitespace becomes `_`, and anything
/// outside `[A-Za-z0-9._-]` is removed. Stem and extension are capped so the
/// name plus a collision suffix stays far below filesystem limits. Never
/// returns an empty name or one starting with a dot.
pub fn sanitize_filename(original: &str) -> String {
    let basename = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(original);

    let mut out = String::with_capacity(basename.len());
    for ch in basename.trim().chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }

    let (stem, ext) = split_extension(&out);
    let stem: String = stem
        .trim_start_matches('.')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let ext: Option<String> = ext.map(|e| e.chars().take(MAX_EXT_CHARS).collect());

    match (stem.is_empty(), ext) {
        (true, Some(ext)) => format!("file.{}", ext),
        (true, None) => "file".to_string(),
        (false, Some(ext)) => format!("{}.{}", stem, ext),
        (false, None) => stem,
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext)),
        Some((stem, _)) => (stem, None),
        None => (name, None),
    }
}

fn with_random_suffix(name: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &token[..7];

    match split_extension(name) {
        (stem, Some(ext)) => format!("{}_{}.{}", stem, suffix, ext),
        (stem, None) => format!("{}_{}", stem, suffix),
    }
}
