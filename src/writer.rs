//! Writes declaration files into a workspace folder's modules directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::fs::FileSystem;
use crate::scope::Scope;
use crate::typings::TrackedFile;

/// Writes declaration files into a scope's modules directory
#[derive(Clone)]
pub struct DestinationWriter {
    fs: Arc<dyn FileSystem>,
}

impl DestinationWriter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Make sure the scope's modules directory exists and return it
    pub async fn ensure_dir(&self, scope: &Scope) -> Result<PathBuf> {
        let dir = scope.modules_dir();
        self.fs
            .create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Overwrite `file` inside `dir`, returning the path written
    pub async fn write(&self, dir: &Path, file: TrackedFile, content: &str) -> Result<PathBuf> {
        let path = dir.join(file.file_name());
        self.fs
            .write(&path, content.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}
