//! Companion `jsconfig.json` that points the editor's type checker at the
//! synced declaration files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::scope::Scope;
use crate::typings::MODULES_DIR_NAME;

pub const JSCONFIG_FILE_NAME: &str = "jsconfig.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsConfig {
    compiler_options: CompilerOptions,
    include: Vec<String>,
    exclude: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    check_js: bool,
    target: &'static str,
    module: &'static str,
    allow_js: bool,
    module_resolution: &'static str,
    lib: Vec<&'static str>,
    types: Vec<String>,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            compiler_options: CompilerOptions {
                check_js: true,
                target: "ES2020",
                module: "ESNext",
                allow_js: true,
                module_resolution: "Bundler",
                lib: vec!["ES2020", "DOM"],
                types: Vec::new(),
            },
            include: vec![
                "**/*.js".to_string(),
                format!("{}/**/*.d.ts", MODULES_DIR_NAME),
            ],
            exclude: vec!["node_modules".into(), "dist".into(), "out".into()],
        }
    }
}

/// Default `jsconfig.json` content, pretty-printed
pub fn render() -> Result<String> {
    serde_json::to_string_pretty(&JsConfig::default()).context("Failed to serialize jsconfig")
}

/// Create `jsconfig.json` in the scope root unless one already exists.
///
/// Returns the path when a new file was written.
pub async fn ensure(fs: &dyn FileSystem, scope: &Scope) -> Result<Option<PathBuf>> {
    let path = scope.root().join(JSCONFIG_FILE_NAME);
    if fs.exists(&path).await {
        debug!("Keeping existing {}", path.display());
        return Ok(None);
    }

    fs.write(&path, render()?.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Created {}", path.display());
    Ok(Some(path))
}
