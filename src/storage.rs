use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{info, warn};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid file name: {}", .0.display())]
    BadName(PathBuf),
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MediaStoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        MediaStoreError::Io { path: path.to_path_buf(), source }
    }
}

/// How an imported file is named inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    /// Keep the source file name; an existing file of that name is reused as is.
    KeepName,
    /// Sanitised stem + `_` + 8 hex chars + original extension.
    UniqueSuffix,
}

pub trait MediaStore {
    /// Copies `source` into the store and returns the stored file name.
    fn import(&self, source: &Path, policy: NamePolicy) -> Result<String, MediaStoreError>;
    /// Removes a stored file. Returns false when there was nothing to remove.
    fn remove(&self, name: &str) -> Result<bool, MediaStoreError>;
    fn exists(&self, name: &str) -> bool;
    /// Where `name` would live, for display. Not checked against the root.
    fn path_of(&self, name: &str) -> PathBuf;
}

// ---------------- File-system implementation ----------------
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `name` inside the store. Only a single plain file name is
    /// accepted, so a stored reference cannot reach outside the root.
    fn contained(&self, name: &str) -> Result<PathBuf, MediaStoreError> {
        let mut parts = Path::new(name).components();
        match (parts.next(), parts.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.root.join(file)),
            _ => Err(MediaStoreError::BadName(PathBuf::from(name))),
        }
    }

    fn ensure_root(&self) -> Result<(), MediaStoreError> {
        fs::create_dir_all(&self.root).map_err(|e| MediaStoreError::io(&self.root, e))
    }
}

impl MediaStore for FsMediaStore {
    fn import(&self, source: &Path, policy: NamePolicy) -> Result<String, MediaStoreError> {
        if !source.is_file() {
            return Err(MediaStoreError::NotFound(source.to_path_buf()));
        }
        let name = match policy {
            NamePolicy::KeepName => source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| MediaStoreError::BadName(source.to_path_buf()))?,
            NamePolicy::UniqueSuffix => unique_name(source),
        };
        self.ensure_root()?;
        let dest = self.root.join(&name);

        if policy == NamePolicy::KeepName && dest.exists() {
            // Same name already stored: keep the stored copy, but say so when it differs.
            match (file_digest(source), file_digest(&dest)) {
                (Ok(a), Ok(b)) if a != b => warn!(
                    "'{}' already exists with different content; keeping the stored file",
                    dest.display()
                ),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("could not compare '{}' with stored copy: {e}", source.display())
                }
                _ => {}
            }
            return Ok(name);
        }

        fs::copy(source, &dest).map_err(|e| MediaStoreError::io(&dest, e))?;
        info!("stored '{}' as '{}'", source.display(), dest.display());
        Ok(name)
    }

    fn remove(&self, name: &str) -> Result<bool, MediaStoreError> {
        remove_if_present(&self.contained(name)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.contained(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Deletes `path` if it exists.
fn remove_if_present(path: &Path) -> Result<bool, MediaStoreError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("removed '{}'", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MediaStoreError::io(path, e)),
    }
}

/// Hex SHA-256 of a file's content.
pub fn file_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn unique_name(source: &Path) -> String {
    let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let mut safe: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    safe.truncate(safe.trim_end().len());
    if safe.is_empty() {
        safe.push_str("attachment");
    }
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{safe}_{suffix}.{ext}"),
        None => format!("{safe}_{suffix}"),
    }
}
