//! Profile image storage on local disk.
//!
//! # Responsibility
//! - Own the flat upload directory holding official profile images.
//! - Move validated uploads in under random names and delete replaced files.
//!
//! # Invariants
//! - Stored names are `RANDOM_NAME_LEN` alphanumeric chars plus the original
//!   extension; no subdirectories are created below the upload directory.
//! - Deleting a file that is already gone is not an error.
//! - Name collisions are not checked.

pub mod upload;

use log::{debug, info};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub use upload::{UploadInspection, UploadedImage};

/// Length of the random part of a stored filename.
pub const RANDOM_NAME_LEN: usize = 20;

pub type StorageResult<T> = Result<T, StorageError>;

/// File-system failure while placing or removing a profile image.
#[derive(Debug)]
pub enum StorageError {
    CreateDir { path: PathBuf, source: io::Error },
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    Remove { path: PathBuf, source: io::Error },
    /// Stored name would escape the upload directory.
    InvalidFileName(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir { path, source } => {
                write!(f, "failed to create upload directory `{}`: {source}", path.display())
            }
            Self::Move { from, to, source } => write!(
                f,
                "failed to move upload `{}` to `{}`: {source}",
                from.display(),
                to.display()
            ),
            Self::Remove { path, source } => {
                write!(f, "failed to remove `{}`: {source}", path.display())
            }
            Self::InvalidFileName(name) => write!(f, "invalid stored file name `{name}`"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. }
            | Self::Move { source, .. }
            | Self::Remove { source, .. } => Some(source),
            Self::InvalidFileName(_) => None,
        }
    }
}

/// Generates a stored filename: random token plus `.extension` when given.
pub fn generate_file_name(extension: Option<&str>) -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect();
    match extension {
        Some(ext) if !ext.is_empty() => format!("{token}.{ext}"),
        _ => token,
    }
}

/// Flat directory of profile images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directory when missing. Idempotent.
    pub fn ensure_dir(&self) -> StorageResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|source| StorageError::CreateDir {
            path: self.root.clone(),
            source,
        })
    }

    /// Absolute-or-relative path of a stored file.
    pub fn path_of(&self, file_name: &str) -> StorageResult<PathBuf> {
        if !is_flat_file_name(file_name) {
            return Err(StorageError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.path_of(file_name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Moves an upload into the directory under a fresh random name.
    ///
    /// Returns the stored filename. The directory is created first.
    pub fn store(&self, upload: &UploadedImage) -> StorageResult<String> {
        self.ensure_dir()?;
        let extension = upload.extension();
        let file_name = generate_file_name(extension.as_deref());
        let target = self.root.join(&file_name);

        move_file(&upload.path, &target).map_err(|source| StorageError::Move {
            from: upload.path.clone(),
            to: target.clone(),
            source,
        })?;

        info!(
            "event=image_store module=storage status=ok extension={}",
            extension.as_deref().unwrap_or("none")
        );
        Ok(file_name)
    }

    /// Deletes a stored file; a file that is already gone is ignored.
    pub fn remove(&self, file_name: &str) -> StorageResult<()> {
        let path = self.path_of(file_name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("event=image_remove module=storage status=ok");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("event=image_remove module=storage status=skipped reason=missing");
                Ok(())
            }
            Err(source) => Err(StorageError::Remove { path, source }),
        }
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        // Cross-device rename: fall back to copy then unlink.
        Err(_) if from.is_file() => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
        Err(err) => Err(err),
    }
}

fn is_flat_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
