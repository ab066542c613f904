//! Destination scopes (workspace folders) and scope selection

use anyhow::{Context, Result};
use reqwest::Url;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::typings::MODULES_DIR_NAME;

/// One workspace folder that receives its own copy of the typings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    name: String,
    root: PathBuf,
    identity: String,
}

impl Scope {
    /// Build a scope for `root`. Relative paths are resolved against the
    /// current directory so the identity stays stable between runs.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory")?
                .join(root)
        };

        let identity = Url::from_file_path(&root)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("file://{}", root.display()));

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        Ok(Self {
            name,
            root,
            identity,
        })
    }

    /// Display name (the folder name)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stable identity used to namespace freshness tokens
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Directory holding the synced declaration files
    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR_NAME)
    }
}

/// Chooses one scope out of several candidates
pub trait ScopePicker {
    fn pick(&self, candidates: &[Scope]) -> Result<Option<Scope>>;
}

/// Resolve the destination for a single-scope operation.
///
/// One candidate is taken as-is, several are handed to the picker, and none
/// yields `None`.
pub fn select_scope(candidates: &[Scope], picker: &dyn ScopePicker) -> Result<Option<Scope>> {
    match candidates {
        [] => Ok(None),
        [only] => {
            debug!("Single workspace folder, selecting {}", only.name());
            Ok(Some(only.clone()))
        }
        _ => picker.pick(candidates),
    }
}

/// Numbered prompt on stdin/stdout
pub struct PromptPicker;

impl ScopePicker for PromptPicker {
    fn pick(&self, candidates: &[Scope]) -> Result<Option<Scope>> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        prompt_for_scope(candidates, &mut stdin.lock(), &mut stdout)
    }
}

fn prompt_for_scope(
    candidates: &[Scope],
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<Option<Scope>> {
    writeln!(
        output,
        "Select a workspace folder to initialize Sciter typings (creates \"{}\" there):",
        MODULES_DIR_NAME
    )?;
    for (index, scope) in candidates.iter().enumerate() {
        writeln!(output, "  {}) {} ({})", index + 1, scope.name(), scope.root().display())?;
    }
    write!(output, "> ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read selection")?;

    let choice = line.trim();
    if choice.is_empty() {
        return Ok(None);
    }

    Ok(choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| candidates.get(index))
        .cloned())
}
