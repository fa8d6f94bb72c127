//! Per-run temporary output directories for compiled templates

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::config::WorkspaceConfig;
use crate::error::CleanupError;

/// Where scratch directories are created and how they are named
#[derive(Debug, Clone)]
pub struct ScratchConfig {
    /// Parent directory of every scratch directory
    pub parent: PathBuf,

    /// Name prefix; a random suffix makes each directory unique
    pub prefix: String,
}

impl ScratchConfig {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
            prefix: WorkspaceConfig::default().prefix,
        }
    }

    /// Build from config, defaulting the parent to the working directory
    pub fn from_config(config: &WorkspaceConfig, work_dir: &Path) -> Self {
        Self {
            parent: config.temp_parent.clone().unwrap_or_else(|| work_dir.to_path_buf()),
            prefix: config.prefix.clone(),
        }
    }
}

/// A uniquely named directory that is removed when the run is over
///
/// [`ScratchDir::cleanup`] removes it and reports failures. If the guard is
/// dropped instead (cancelled future, panic), `TempDir` removes it on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under `config.parent`
    pub async fn create(config: &ScratchConfig) -> io::Result<Self> {
        debug!(?config, "ScratchDir::create: called");
        tokio::fs::create_dir_all(&config.parent).await?;

        let parent = config.parent.clone();
        let prefix = config.prefix.clone();
        let dir = tokio::task::spawn_blocking(move || tempfile::Builder::new().prefix(&prefix).tempdir_in(&parent))
            .await
            .map_err(io::Error::other)??;

        debug!(path = ?dir.path(), "ScratchDir::create: created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it
    ///
    /// A directory that is already gone counts as removed.
    pub async fn cleanup(self) -> Result<(), CleanupError> {
        let path = self.dir.path().to_path_buf();
        debug!(?path, "ScratchDir::cleanup: called");
        let dir = self.dir;

        let result = tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(io::Error::other)
            .and_then(|closed| closed);

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("ScratchDir::cleanup: already removed");
                Ok(())
            }
            Err(source) => Err(CleanupError { path, source }),
        }
    }
}
