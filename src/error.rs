//! Error types for the typings sync engine.
//!
//! Per-file failures ([`FetchError`], [`FallbackUnavailable`]) stay inside the
//! orchestrator and are only logged. [`TypingsError`] covers the conditions
//! that reach the command layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::typings::TrackedFile;

/// Transient failure retrieving a file from the remote source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The bundled snapshot has no readable copy of a file
#[derive(Debug, Error)]
#[error("bundled copy of {file} unavailable at {}: {source}", path.display())]
pub struct FallbackUnavailable {
    pub file: TrackedFile,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Operation-level failures surfaced to the user
#[derive(Debug, Error)]
pub enum TypingsError {
    #[error("no typings files could be written to {}", root.display())]
    NoWritableFiles { root: PathBuf },

    #[error("no workspace folder selected")]
    NoDestinationSelected,
}
