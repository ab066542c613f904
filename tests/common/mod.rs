//! Common test utilities and helpers for sciter-typings tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sciter_typings::{
    BundledSnapshot, FreshnessStore, HttpFetcher, KeyValueStore, LocalFs, MemoryStore, Scope,
    SyncEngine, TrackedFile,
};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Remote content served for `file`
pub fn remote_content(file: TrackedFile) -> String {
    format!("// remote {}\ndeclare const x: number;\n", file.file_name())
}

/// Bundled content shipped for `file`
pub fn bundled_content(file: TrackedFile) -> String {
    format!("// bundled {}\n", file.file_name())
}

/// ETag the test server hands out for `file`
pub fn etag_for(file: TrackedFile) -> String {
    format!("\"v1-{}\"", file.file_name())
}

fn file_path(file: TrackedFile) -> String {
    format!("/{}", file.file_name())
}

/// wiremock server standing in for the upstream typings repository
pub struct TypingsServer {
    pub server: MockServer,
}

impl TypingsServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Serve every file with content and an ETag, answering 304 when the
    /// matching ETag comes back
    pub async fn serve_all(&self) {
        for file in TrackedFile::ALL {
            self.serve_not_modified(file, &etag_for(file)).await;
            self.serve(file, &remote_content(file), Some(&etag_for(file)))
                .await;
        }
    }

    /// Serve every file without an ETag header
    pub async fn serve_all_without_etag(&self) {
        for file in TrackedFile::ALL {
            self.serve(file, &remote_content(file), None).await;
        }
    }

    pub async fn serve(&self, file: TrackedFile, body: &str, etag: Option<&str>) {
        let mut response = ResponseTemplate::new(200).set_body_string(body);
        if let Some(etag) = etag {
            response = response.insert_header("ETag", etag);
        }
        Mock::given(method("GET"))
            .and(path(file_path(file)))
            .respond_with(response)
            .with_priority(5)
            .mount(&self.server)
            .await;
    }

    /// Answer 304 for requests carrying `etag`
    pub async fn serve_not_modified(&self, file: TrackedFile, etag: &str) {
        Mock::given(method("GET"))
            .and(path(file_path(file)))
            .and(header("If-None-Match", etag))
            .respond_with(ResponseTemplate::new(304))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    pub async fn fail(&self, file: TrackedFile, status: u16) {
        Mock::given(method("GET"))
            .and(path(file_path(file)))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    pub async fn fail_all(&self, status: u16) {
        for file in TrackedFile::ALL {
            self.fail(file, status).await;
        }
    }
}

/// Bundled snapshot directory
pub struct Bundle {
    pub dir: TempDir,
}

impl Bundle {
    /// A snapshot holding every tracked file
    pub fn complete() -> Self {
        Self::with_files(&TrackedFile::ALL)
    }

    pub fn with_files(files: &[TrackedFile]) -> Self {
        let dir = TempDir::new().expect("Failed to create bundle dir");
        for file in files {
            std::fs::write(dir.path().join(file.file_name()), bundled_content(*file))
                .expect("Failed to write bundled file");
        }
        Self { dir }
    }

    pub fn empty() -> Self {
        Self::with_files(&[])
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// A workspace folder that receives the typings
pub struct Workspace {
    pub dir: TempDir,
    pub scope: Scope,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create workspace dir");
        let scope = Scope::new(dir.path()).expect("Failed to build scope");
        Self { dir, scope }
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.scope.modules_dir()
    }

    pub fn read(&self, file: TrackedFile) -> Option<String> {
        std::fs::read_to_string(self.modules_dir().join(file.file_name())).ok()
    }

    /// File names currently present in the modules directory, sorted
    pub fn listing(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.modules_dir()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

pub fn memory_tokens() -> FreshnessStore {
    FreshnessStore::new(Arc::new(MemoryStore::new()))
}

pub fn tokens_over(store: Arc<dyn KeyValueStore>) -> FreshnessStore {
    FreshnessStore::new(store)
}

/// Engine wired to the given remote, bundle and token store
pub fn engine(base_url: &str, bundle: &Path, tokens: FreshnessStore) -> SyncEngine {
    let fs = Arc::new(LocalFs);
    let fetcher =
        HttpFetcher::new(base_url, Duration::from_secs(5)).expect("Failed to build fetcher");
    SyncEngine::new(
        Arc::new(fetcher),
        tokens,
        BundledSnapshot::new(bundle, fs.clone()),
        fs,
    )
}

/// Base URL nothing listens on
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9/sciter_modules";

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
