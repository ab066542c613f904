//! Sync Engine - Orchestrates typings synchronization per workspace folder
//!
//! This module drives the per-file decision loop (fetch, skip, or fall back)
//! over the tracked declaration files, combining the remote fetcher, the
//! freshness store, the bundled snapshot and the destination writer.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::TypingsError;
use crate::fallback::BundledSnapshot;
use crate::fetcher::{FetchOutcome, RemoteFetcher};
use crate::fs::FileSystem;
use crate::jsconfig;
use crate::scope::Scope;
use crate::state::FreshnessStore;
use crate::typings::TrackedFile;
use crate::writer::DestinationWriter;

/// What happened to one tracked file during a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Fresh content was written
    Updated { path: PathBuf, etag: Option<String> },
    /// The server reported no change; nothing was written
    Unchanged,
    /// The server answered with an empty body; nothing was written or stored
    Empty,
    /// The remote failed and the bundled copy was written instead
    Recovered { path: PathBuf, cause: String },
    /// Both the remote and the bundled copy failed; retried next sync
    Skipped {
        remote_error: String,
        fallback_error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: TrackedFile,
    pub outcome: FileOutcome,
}

impl FileReport {
    /// Location written for this file, if any
    pub fn written(&self) -> Option<&Path> {
        match &self.outcome {
            FileOutcome::Updated { path, .. } | FileOutcome::Recovered { path, .. } => Some(path),
            FileOutcome::Unchanged | FileOutcome::Empty | FileOutcome::Skipped { .. } => None,
        }
    }
}

/// Results from syncing one scope
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub scope: Scope,
    pub files: Vec<FileReport>,
    pub duration: Duration,
}

impl SyncReport {
    /// Locations written during the sync, in declaration order
    pub fn written(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter_map(|report| report.written().map(Path::to_path_buf))
            .collect()
    }

    pub fn updated_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Updated { .. }))
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unchanged))
    }

    pub fn empty_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Empty))
    }

    pub fn recovered_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Recovered { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Outcome of refreshing one scope during an update
#[derive(Debug)]
pub enum ScopeUpdate {
    Refreshed(SyncReport),
    Failed { scope: Scope, error: String },
}

/// Results from updating every known scope
#[derive(Debug)]
pub struct UpdateSummary {
    pub total_scopes: usize,
    pub refreshed_scopes: usize,
    pub failed_scopes: usize,
    pub files_written: usize,
    pub duration: Duration,
    pub results: Vec<ScopeUpdate>,
}

/// The main sync engine that orchestrates typings synchronization
#[derive(Clone)]
pub struct SyncEngine {
    fetcher: Arc<dyn RemoteFetcher>,
    tokens: FreshnessStore,
    fallback: BundledSnapshot,
    writer: DestinationWriter,
    fs: Arc<dyn FileSystem>,
    max_parallel: usize,
}

impl SyncEngine {
    pub fn new(
        fetcher: Arc<dyn RemoteFetcher>,
        tokens: FreshnessStore,
        fallback: BundledSnapshot,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            fetcher,
            tokens,
            fallback,
            writer: DestinationWriter::new(fs.clone()),
            fs,
            max_parallel: 4,
        }
    }

    /// Limit how many files are processed at once
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn tokens(&self) -> &FreshnessStore {
        &self.tokens
    }

    pub fn fallback(&self) -> &BundledSnapshot {
        &self.fallback
    }

    /// Sync every tracked file into `scope`.
    ///
    /// With `use_token` the stored validators make each request conditional;
    /// without it every file is fetched unconditionally. Per-file failures are
    /// contained in the report; only failing to create the target directory
    /// is an error.
    pub async fn sync_scope(&self, scope: &Scope, use_token: bool) -> Result<SyncReport> {
        let start_time = Instant::now();
        let dir = self.writer.ensure_dir(scope).await?;

        debug!(
            "Syncing {} files into {} (conditional: {})",
            TrackedFile::ALL.len(),
            dir.display(),
            use_token
        );

        let files = stream::iter(TrackedFile::ALL)
            .map(|file| self.sync_file(scope, &dir, file, use_token))
            .buffered(self.max_parallel)
            .collect::<Vec<_>>()
            .await;

        let report = SyncReport {
            scope: scope.clone(),
            files,
            duration: start_time.elapsed(),
        };

        info!(
            "Synced {} in {:.2}s: {} updated, {} unchanged, {} empty, {} from bundle, {} skipped",
            scope.name(),
            report.duration.as_secs_f64(),
            report.updated_count(),
            report.unchanged_count(),
            report.empty_count(),
            report.recovered_count(),
            report.skipped_count()
        );

        Ok(report)
    }

    /// Discard the scope's typings and validators, then fetch everything again
    pub async fn reset_and_sync(&self, scope: &Scope) -> Result<SyncReport> {
        let dir = scope.modules_dir();
        if let Err(e) = self.fs.remove_dir_all(&dir).await {
            warn!("Failed to remove {}: {}", dir.display(), e);
        }

        for file in TrackedFile::ALL {
            self.tokens
                .clear(scope, file)
                .with_context(|| format!("Failed to clear stored ETag for {}", file))?;
        }

        debug!("Reset typings for {}", scope.name());
        self.sync_scope(scope, false).await
    }

    /// First-time setup of one scope.
    ///
    /// Fails with [`TypingsError::NoWritableFiles`] when not a single file
    /// could be written; otherwise also creates the editor config if missing.
    pub async fn initialize(&self, scope: &Scope) -> Result<SyncReport> {
        let report = self.sync_scope(scope, false).await?;

        if report.written().is_empty() {
            return Err(TypingsError::NoWritableFiles {
                root: scope.root().to_path_buf(),
            }
            .into());
        }

        jsconfig::ensure(self.fs.as_ref(), scope).await?;
        Ok(report)
    }

    /// Reset and resync every scope, continuing past failures
    pub async fn update_all(&self, scopes: &[Scope]) -> UpdateSummary {
        let start_time = Instant::now();
        let mut results = Vec::with_capacity(scopes.len());

        for scope in scopes {
            match self.update_scope(scope).await {
                Ok(report) => {
                    if report.written().is_empty() {
                        warn!("No typings written during update for \"{}\"", scope.name());
                    }
                    results.push(ScopeUpdate::Refreshed(report));
                }
                Err(e) => {
                    error!("Failed to update typings in \"{}\": {:#}", scope.name(), e);
                    results.push(ScopeUpdate::Failed {
                        scope: scope.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        let summary = compile_summary(results, start_time.elapsed());
        info!(
            "Update completed in {:.2}s: {} of {} folders refreshed, {} files written",
            summary.duration.as_secs_f64(),
            summary.refreshed_scopes,
            summary.total_scopes,
            summary.files_written
        );
        summary
    }

    async fn update_scope(&self, scope: &Scope) -> Result<SyncReport> {
        let report = self.reset_and_sync(scope).await?;
        jsconfig::ensure(self.fs.as_ref(), scope).await?;
        Ok(report)
    }

    async fn sync_file(
        &self,
        scope: &Scope,
        dir: &Path,
        file: TrackedFile,
        use_token: bool,
    ) -> FileReport {
        let etag = if use_token {
            self.tokens.get(scope, file).unwrap_or_else(|e| {
                warn!("Failed to read stored ETag for {}: {:#}", file, e);
                None
            })
        } else {
            None
        };

        let cause = match self.fetcher.fetch(file, etag).await {
            FetchOutcome::Unchanged => {
                debug!("{} unchanged in {}", file, scope.name());
                return FileReport {
                    file,
                    outcome: FileOutcome::Unchanged,
                };
            }
            FetchOutcome::Updated { content, .. } if content.is_empty() => {
                warn!("Empty response for {} in \"{}\", leaving it untouched", file, scope.name());
                return FileReport {
                    file,
                    outcome: FileOutcome::Empty,
                };
            }
            FetchOutcome::Updated { content, etag } => {
                match self.writer.write(dir, file, &content).await {
                    Ok(path) => {
                        if let Some(etag) = &etag {
                            if let Err(e) = self.tokens.set(scope, file, etag) {
                                warn!("Failed to store ETag for {}: {:#}", file, e);
                            }
                        }
                        return FileReport {
                            file,
                            outcome: FileOutcome::Updated { path, etag },
                        };
                    }
                    Err(e) => format!("{:#}", e),
                }
            }
            FetchOutcome::Failed(e) => e.to_string(),
        };

        self.recover(scope, dir, file, cause).await
    }

    /// Fall back to the bundled copy after a remote failure
    async fn recover(
        &self,
        scope: &Scope,
        dir: &Path,
        file: TrackedFile,
        cause: String,
    ) -> FileReport {
        let fallback = match self.fallback.read(file).await {
            Ok(content) => self
                .writer
                .write(dir, file, &content)
                .await
                .map_err(|e| format!("{:#}", e)),
            Err(e) => Err(e.to_string()),
        };

        let outcome = match fallback {
            Ok(path) => {
                warn!(
                    "Failed to fetch {} for \"{}\", using bundled copy: {}",
                    file,
                    scope.name(),
                    cause
                );
                FileOutcome::Recovered { path, cause }
            }
            Err(fallback_error) => {
                error!(
                    "Failed to update typings for {} in \"{}\". Network error: {}, fallback error: {}",
                    file,
                    scope.name(),
                    cause,
                    fallback_error
                );
                FileOutcome::Skipped {
                    remote_error: cause,
                    fallback_error,
                }
            }
        };

        FileReport { file, outcome }
    }
}

/// Compile update summary from per-scope results
fn compile_summary(results: Vec<ScopeUpdate>, duration: Duration) -> UpdateSummary {
    let mut refreshed_scopes = 0;
    let mut failed_scopes = 0;
    let mut files_written = 0;

    for result in &results {
        match result {
            ScopeUpdate::Refreshed(report) => {
                refreshed_scopes += 1;
                files_written += report.written().len();
            }
            ScopeUpdate::Failed { .. } => failed_scopes += 1,
        }
    }

    UpdateSummary {
        total_scopes: results.len(),
        refreshed_scopes,
        failed_scopes,
        files_written,
        duration,
        results,
    }
}
