//! Bundled snapshot of the declaration files, used when the remote source is
//! unreachable.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::FallbackUnavailable;
use crate::fs::FileSystem;
use crate::typings::{TrackedFile, MODULES_DIR_NAME};

/// Read-only copy of the typings shipped next to the executable
#[derive(Clone)]
pub struct BundledSnapshot {
    dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl BundledSnapshot {
    pub fn new(dir: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            dir: dir.into(),
            fs,
        }
    }

    /// Resolve the snapshot location once at startup.
    ///
    /// An explicitly configured directory wins. Otherwise the snapshot is
    /// looked up next to the running executable, then under the user data
    /// directory.
    pub fn locate(configured: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = configured {
            return Ok(dir.to_path_buf());
        }

        let exe = std::env::current_exe().context("Failed to locate current executable")?;
        if let Some(install_root) = exe.parent() {
            let beside_exe = install_root.join(MODULES_DIR_NAME);
            if beside_exe.is_dir() {
                return Ok(beside_exe);
            }
        }

        Ok(Config::data_dir()?.join(MODULES_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Last-known-good content for `file`
    pub async fn read(&self, file: TrackedFile) -> Result<String, FallbackUnavailable> {
        let path = self.dir.join(file.file_name());
        self.fs
            .read_to_string(&path)
            .await
            .map_err(|source| FallbackUnavailable { file, path, source })
    }

    /// Tracked files the snapshot has no copy of
    pub async fn missing_files(&self) -> Vec<TrackedFile> {
        let mut missing = Vec::new();
        for file in TrackedFile::ALL {
            if !self.fs.exists(&self.dir.join(file.file_name())).await {
                missing.push(file);
            }
        }
        missing
    }
}
