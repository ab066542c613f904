use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scope::Scope;
use crate::typings::DEFAULT_BASE_URL;

/// Main configuration structure for sciter-typings
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Workspace folders that receive the typings
    #[serde(default)]
    pub workspaces: Vec<String>,

    /// Upstream source settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Where persistent state and the bundled snapshot live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream source configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    /// Base URL the declaration file names are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for each request in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Maximum files fetched at once
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

/// Storage locations
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// State database path (defaults to XDG_DATA_HOME/sciter-typings/state.db)
    pub state_db: Option<String>,

    /// Bundled snapshot directory (defaults to sciter_modules next to the executable)
    pub bundle_dir: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_parallel() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();

            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("sciter-typings").join("config.yml"))
    }

    /// Per-user data directory holding the state database and the fallback bundle
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Failed to get user data directory")?;

        Ok(data_dir.join("sciter-typings"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        for workspace in &mut self.workspaces {
            *workspace = shellexpand::full(workspace)
                .with_context(|| format!("Failed to expand workspace path: {}", workspace))?
                .into_owned();
        }

        if let Some(state_db) = &mut self.storage.state_db {
            *state_db = shellexpand::full(state_db)
                .context("Failed to expand state_db path")?
                .into_owned();
        }

        if let Some(bundle_dir) = &mut self.storage.bundle_dir {
            *bundle_dir = shellexpand::full(bundle_dir)
                .context("Failed to expand bundle_dir path")?
                .into_owned();
        }

        Ok(())
    }

    /// Configured workspaces as destination scopes
    pub fn scopes(&self) -> Result<Vec<Scope>> {
        self.workspaces.iter().map(|w| Scope::new(w)).collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout)
    }

    pub fn state_db_path(&self) -> Option<PathBuf> {
        self.storage.state_db.as_ref().map(PathBuf::from)
    }

    pub fn bundle_dir(&self) -> Option<PathBuf> {
        self.storage.bundle_dir.as_ref().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    // Helper function to create a temporary config directory
    fn setup_test_config_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("sciter-typings");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        (temp_dir, config_dir)
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert!(config.workspaces.is_empty());
        assert_eq!(config.remote.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.remote.timeout, 30);
        assert_eq!(config.sync.max_parallel, 4);
        assert!(config.storage.state_db.is_none());
        assert!(config.storage.bundle_dir.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_expand_paths() {
        env::set_var("TEST_SCITER_TYPINGS_HOME", "/test/home");

        let mut config = Config::default();
        config.workspaces = vec!["${TEST_SCITER_TYPINGS_HOME}/app".to_string()];
        config.storage.state_db = Some("${TEST_SCITER_TYPINGS_HOME}/state.db".to_string());

        config.expand_paths().expect("Failed to expand paths");

        assert_eq!(config.workspaces, vec!["/test/home/app"]);
        assert_eq!(config.state_db_path(), Some(PathBuf::from("/test/home/state.db")));

        env::remove_var("TEST_SCITER_TYPINGS_HOME");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let nonexistent_path = Path::new("/nonexistent/path/config.yml");
        let result = Config::load(nonexistent_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let (_temp_dir, config_dir) = setup_test_config_dir();
        let config_path = config_dir.join("config.yml");

        let mut config = Config::default();
        config.workspaces = vec!["/work/app".to_string(), "/work/lib".to_string()];
        config.remote.timeout = 5;
        config.sync.max_parallel = 8;

        config.save(&config_path).expect("Failed to save config");
        let loaded_config = Config::load(&config_path).expect("Failed to load config");

        assert_eq!(loaded_config.workspaces, config.workspaces);
        assert_eq!(loaded_config.remote.timeout, 5);
        assert_eq!(loaded_config.sync.max_parallel, 8);
        assert_eq!(loaded_config.scopes().unwrap().len(), 2);
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("sciter-typings"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    fn test_state_and_bundle_share_data_dir() {
        let data_dir = Config::data_dir().expect("Failed to get data dir");
        assert_eq!(data_dir, dirs::data_dir().unwrap().join("sciter-typings"));

        let db_path = crate::state::SqliteStore::default_db_path().unwrap();
        assert_eq!(db_path, data_dir.join("state.db"));

        let bundle = crate::fallback::BundledSnapshot::locate(None).unwrap();
        assert_eq!(bundle, data_dir.join("sciter_modules"));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
workspaces:
  - /work/app
remote:
  base_url: "http://localhost:8080/typings"
  timeout: 10
sync:
  max_parallel: 2
storage:
  state_db: /var/lib/sciter/state.db
  bundle_dir: /opt/sciter/sciter_modules
logging:
  level: "debug"
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.workspaces, vec!["/work/app"]);
        assert_eq!(config.remote.base_url, "http://localhost:8080/typings");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.sync.max_parallel, 2);
        assert_eq!(
            config.bundle_dir(),
            Some(PathBuf::from("/opt/sciter/sciter_modules"))
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("workspaces: []\n").unwrap();
        assert_eq!(config.remote.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.sync.max_parallel, 4);
    }
}
