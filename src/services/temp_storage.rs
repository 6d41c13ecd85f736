use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    domain::models::file::{ArtifactKind, ARTIFACT_PREFIX},
    services::error::StorageError,
};

/// Owns the process-wide scratch directory. Built once at startup and shared
/// by every request; requests never see each other's paths.
#[derive(Debug)]
pub struct TempStorage {
    dir: PathBuf,
}

impl TempStorage {
    /// Creates `dir` if needed and removes artifacts a previous run left
    /// behind. Errors here should abort startup.
    pub async fn init(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let storage = Self { dir };
        let swept = storage.sweep().await?;
        if swept > 0 {
            info!(
                "Removed {} stale artifacts from {}",
                swept,
                storage.dir.display()
            );
        }

        Ok(storage)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<prefix>-<unix millis>-<uuid>.<ext>`. The timestamp keeps listings
    /// ordered; the UUID makes same-millisecond requests distinct.
    pub fn unique_path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(format!(
            "{}-{}-{}.{}",
            ARTIFACT_PREFIX,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            kind.extension()
        ))
    }

    /// Claims a fresh path. Nothing is written yet, but whatever ends up at
    /// the path is deleted when the returned guard drops.
    pub fn reserve(&self, kind: ArtifactKind) -> TempArtifact {
        TempArtifact {
            path: self.unique_path(kind),
            kind,
        }
    }

    async fn sweep(&self) -> Result<usize, StorageError> {
        let read_dir_error = |source| StorageError::ReadDir {
            path: self.dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.dir).await.map_err(read_dir_error)?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
            let name = entry.file_name();
            let is_ours = name
                .to_str()
                .is_some_and(|n| n.starts_with(&format!("{}-", ARTIFACT_PREFIX)));
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());

            if !(is_ours && is_file) {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Cannot remove stale artifact {:?}: {}", name, e),
            }
        }

        Ok(removed)
    }
}

/// Scoped ownership of one temporary file. Dropping the guard deletes the
/// file; the guard is not `Clone`, so deletion happens at most once.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    kind: ArtifactKind,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub async fn create(&self) -> Result<fs::File, StorageError> {
        fs::File::create(&self.path)
            .await
            .map_err(|source| self.write_error(source))
    }

    pub fn write_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {:?} artifact {}", self.kind, self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{:?} artifact {} was never written", self.kind, self.path.display())
            }
            Err(e) => warn!(
                "Failed to remove {:?} artifact {}: {}",
                self.kind,
                self.path.display(),
                e
            ),
        }
    }
}
