//! System health checks for sciter-typings
//!
//! This module provides preflight checks to verify the system is properly
//! configured before running operations.

use std::path::Path;
use std::sync::Arc;

use crate::fallback::BundledSnapshot;
use crate::fetcher::{FetchOutcome, HttpFetcher, RemoteFetcher};
use crate::fs::LocalFs;
use crate::state::SqliteStore;
use crate::typings::TrackedFile;
use crate::Config;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Configuration values are usable
    pub config: CheckResult,
    /// State database status
    pub state_db: CheckResult,
    /// Bundled snapshot completeness
    pub bundle: CheckResult,
    /// Remote source reachability
    pub remote: CheckResult,
    /// Configured workspaces (warning only, not required)
    pub workspaces: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

#[allow(dead_code)]
impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: true,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub async fn run(config: &Config) -> Self {
        Self {
            config: Self::check_config(config),
            state_db: Self::check_state_db(config),
            bundle: Self::check_bundle(config).await,
            remote: Self::check_remote(config).await,
            workspaces: Self::check_workspaces(config),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.config.passed && self.state_db.passed && self.bundle.passed && self.remote.passed
        // Workspaces are optional, not included in required checks
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| r.is_warning)
            .collect()
    }

    /// Check the configured values are usable
    fn check_config(config: &Config) -> CheckResult {
        let mut problems = Vec::new();

        if let Err(e) = reqwest::Url::parse(&config.remote.base_url) {
            problems.push(format!("remote.base_url {:?}: {}", config.remote.base_url, e));
        }
        if config.remote.timeout == 0 {
            problems.push("remote.timeout must be at least 1 second".to_string());
        }
        if config.sync.max_parallel == 0 {
            problems.push("sync.max_parallel must be at least 1".to_string());
        }
        if config
            .logging
            .level
            .parse::<tracing_subscriber::filter::LevelFilter>()
            .is_err()
        {
            problems.push(format!("logging.level {:?} is not a log level", config.logging.level));
        }

        if problems.is_empty() {
            CheckResult::ok("Configuration valid")
        } else {
            CheckResult::error_with_details("Configuration invalid", problems.join("\n"))
        }
    }

    /// Check the state database opens
    fn check_state_db(config: &Config) -> CheckResult {
        let path = match config.state_db_path() {
            Some(path) => path,
            None => match SqliteStore::default_db_path() {
                Ok(path) => path,
                Err(e) => {
                    return CheckResult::error_with_details(
                        "Cannot resolve state database path",
                        e.to_string(),
                    )
                }
            },
        };

        match SqliteStore::open_at(path.clone()) {
            Ok(_) => CheckResult::ok_with_details("State database ready", path.display().to_string()),
            Err(e) => CheckResult::error_with_details(
                "State database unavailable",
                format!("{}: {:#}", path.display(), e),
            ),
        }
    }

    /// Check the bundled snapshot has every tracked file
    async fn check_bundle(config: &Config) -> CheckResult {
        let dir = match BundledSnapshot::locate(config.bundle_dir().as_deref()) {
            Ok(dir) => dir,
            Err(e) => {
                return CheckResult::error_with_details(
                    "Cannot locate bundled typings",
                    e.to_string(),
                )
            }
        };

        if !dir.is_dir() {
            return CheckResult::error_with_details(
                "Bundled typings directory not found",
                format!(
                    "{}\nSet storage.bundle_dir in the configuration",
                    dir.display()
                ),
            );
        }

        let snapshot = BundledSnapshot::new(&dir, Arc::new(LocalFs));
        let missing = snapshot.missing_files().await;
        if missing.is_empty() {
            CheckResult::ok_with_details("Bundled typings complete", dir.display().to_string())
        } else {
            let names: Vec<_> = missing.iter().map(|f| f.file_name()).collect();
            CheckResult::warning_with_details(
                format!("Bundled typings missing {} file(s)", missing.len()),
                names.join(", "),
            )
        }
    }

    /// Check the remote source answers
    async fn check_remote(config: &Config) -> CheckResult {
        let fetcher = match HttpFetcher::new(&config.remote.base_url, config.request_timeout()) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                return CheckResult::error_with_details("Cannot build HTTP client", e.to_string())
            }
        };

        let probe = TrackedFile::ALL[0];
        match fetcher.fetch(probe, None).await {
            FetchOutcome::Updated { .. } | FetchOutcome::Unchanged => {
                CheckResult::ok_with_details("Remote typings reachable", probe.url(fetcher.base_url()))
            }
            FetchOutcome::Failed(e) => CheckResult::error_with_details(
                "Remote typings unreachable",
                format!("{}\nThe bundled snapshot will be used instead", e),
            ),
        }
    }

    /// Check configured workspaces exist (warning only)
    fn check_workspaces(config: &Config) -> CheckResult {
        if config.workspaces.is_empty() {
            return CheckResult::warning_with_details(
                "No workspaces configured",
                "Add folders under `workspaces:` or pass a path to `init`",
            );
        }

        let missing: Vec<_> = config
            .workspaces
            .iter()
            .filter(|w| !Path::new(w).is_dir())
            .cloned()
            .collect();

        if missing.is_empty() {
            CheckResult::ok_with_details(
                format!("{} workspace(s) configured", config.workspaces.len()),
                config.workspaces.join("\n"),
            )
        } else {
            CheckResult::warning_with_details(
                "Some workspaces do not exist",
                missing.join("\n"),
            )
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("Configuration", &self.config),
            ("State Database", &self.state_db),
            ("Bundled Typings", &self.bundle),
            ("Remote Source", &self.remote),
            ("Workspaces", &self.workspaces),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("Test passed");
        assert!(result.passed);
        assert!(!result.is_warning);
        assert!(result.details.is_none());
    }

    #[test]
    fn test_check_result_warning() {
        let result = CheckResult::warning("Test warning");
        assert!(result.passed); // Warnings still "pass"
        assert!(result.is_warning);
    }

    #[test]
    fn test_check_result_error_with_details() {
        let result = CheckResult::error_with_details("Test failed", "Error details");
        assert!(!result.passed);
        assert!(!result.is_warning);
        assert_eq!(result.details, Some("Error details".to_string()));
    }

    #[test]
    fn test_check_config_defaults_pass() {
        let result = HealthCheck::check_config(&Config::default());
        assert!(result.passed);
    }

    #[test]
    fn test_check_config_reports_every_problem() {
        let mut config = Config::default();
        config.remote.base_url = "not a url".to_string();
        config.sync.max_parallel = 0;
        config.logging.level = "loud".to_string();

        let result = HealthCheck::check_config(&config);
        assert!(!result.passed);
        assert_eq!(result.details.unwrap().lines().count(), 3);
    }

    #[test]
    fn test_check_state_db_at_configured_path() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.state_db = Some(temp.path().join("state.db").display().to_string());

        let result = HealthCheck::check_state_db(&config);
        assert!(result.passed);
        assert!(!result.is_warning);
    }

    #[tokio::test]
    async fn test_check_bundle_missing_dir() {
        let mut config = Config::default();
        config.storage.bundle_dir = Some("/nonexistent/sciter_modules".to_string());

        let result = HealthCheck::check_bundle(&config).await;
        assert!(!result.passed);
        assert!(result.details.is_some());
    }

    #[tokio::test]
    async fn test_check_bundle_incomplete_is_warning() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Element.d.ts"), "").unwrap();
        let mut config = Config::default();
        config.storage.bundle_dir = Some(temp.path().display().to_string());

        let result = HealthCheck::check_bundle(&config).await;
        assert!(result.passed);
        assert!(result.is_warning);
        assert!(result.message.contains("16"));
    }

    #[tokio::test]
    async fn test_check_bundle_complete() {
        let temp = TempDir::new().unwrap();
        for file in TrackedFile::ALL {
            std::fs::write(temp.path().join(file.file_name()), "").unwrap();
        }
        let mut config = Config::default();
        config.storage.bundle_dir = Some(temp.path().display().to_string());

        let result = HealthCheck::check_bundle(&config).await;
        assert!(result.passed);
        assert!(!result.is_warning);
    }

    #[tokio::test]
    async fn test_check_remote_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x"))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.remote.base_url = server.uri();

        let result = HealthCheck::check_remote(&config).await;
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_check_remote_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.remote.base_url = server.uri();

        let result = HealthCheck::check_remote(&config).await;
        assert!(!result.passed);
    }

    #[test]
    fn test_check_workspaces() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();

        let empty = HealthCheck::check_workspaces(&config);
        assert!(empty.is_warning);

        config.workspaces = vec![temp.path().display().to_string()];
        let present = HealthCheck::check_workspaces(&config);
        assert!(present.passed && !present.is_warning);

        config.workspaces.push("/nonexistent/workspace".to_string());
        let partial = HealthCheck::check_workspaces(&config);
        assert!(partial.is_warning);
        assert_eq!(partial.details.as_deref(), Some("/nonexistent/workspace"));
    }

    #[test]
    fn test_all_passed_with_workspace_warning() {
        // Workspace warnings should NOT cause all_passed to fail
        let health = HealthCheck {
            config: CheckResult::ok("Config OK"),
            state_db: CheckResult::ok("DB OK"),
            bundle: CheckResult::ok("Bundle OK"),
            remote: CheckResult::ok("Remote OK"),
            workspaces: CheckResult::warning("No workspaces"),
        };
        assert!(health.all_passed());
        assert_eq!(health.warnings().len(), 1);
        assert!(health.errors().is_empty());
    }

    #[test]
    fn test_all_passed_with_failing_remote() {
        let health = HealthCheck {
            config: CheckResult::ok("Config OK"),
            state_db: CheckResult::ok("DB OK"),
            bundle: CheckResult::ok("Bundle OK"),
            remote: CheckResult::error("Remote down"),
            workspaces: CheckResult::ok("Workspaces OK"),
        };
        assert!(!health.all_passed());
        assert_eq!(health.errors().len(), 1);
    }

    #[test]
    fn test_all_checks_returns_all_five() {
        let health = HealthCheck {
            config: CheckResult::ok("Config OK"),
            state_db: CheckResult::ok("DB OK"),
            bundle: CheckResult::ok("Bundle OK"),
            remote: CheckResult::ok("Remote OK"),
            workspaces: CheckResult::ok("Workspaces OK"),
        };
        let checks = health.all_checks();
        assert_eq!(checks.len(), 5);
        assert_eq!(checks[0].0, "Configuration");
        assert_eq!(checks[4].0, "Workspaces");
    }
}
