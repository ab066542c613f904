//! sciter-typings - Sciter declaration files kept in sync per workspace folder
//!
//! sciter-typings mirrors a fixed set of remote `.d.ts` files into each
//! workspace folder, using conditional requests to skip unchanged files and a
//! bundled snapshot when the network is unavailable.
//!
//! ## Modules
//!
//! - [`sync`]: The per-file fetch/skip/fallback orchestration
//! - [`fetcher`]: Conditional HTTP retrieval of declaration files
//! - [`state`]: Freshness tokens persisted in SQLite
//! - [`fallback`]: The bundled snapshot
//! - [`writer`]: Writing files into a workspace folder
//! - [`config`]: Configuration management and parsing

pub mod config;
pub mod error;
pub mod fallback;
pub mod fetcher;
pub mod fs;
pub mod health;
pub mod jsconfig;
pub mod scope;
pub mod state;
pub mod sync;
pub mod typings;
pub mod writer;

pub use config::Config;
pub use error::{FallbackUnavailable, FetchError, TypingsError};
pub use fallback::BundledSnapshot;
pub use fetcher::{FetchOutcome, HttpFetcher, RemoteFetcher};
pub use fs::{FileSystem, LocalFs};
pub use health::HealthCheck;
pub use scope::{select_scope, Scope, ScopePicker};
pub use state::{FreshnessStore, KeyValueStore, MemoryStore, SqliteStore};
pub use sync::{FileOutcome, SyncEngine, SyncReport, UpdateSummary};
pub use typings::TrackedFile;
