//! The fixed set of Sciter declaration files kept in sync.

use std::fmt;

/// Name of the directory that holds the declaration files, both inside a
/// workspace folder and inside the bundled snapshot.
pub const MODULES_DIR_NAME: &str = "sciter_modules";

/// Upstream location of the declaration files
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/shujaatak/sciter-intellisense/main/sciter_modules";

/// One of the declaration files tracked by the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedFile {
    Element,
    ElementSelection,
    ElementState,
    ElementStyle,
    Event,
    Graphics,
    Node,
    Window,
    Behaviors,
    Document,
    Global,
    Jsx,
    ModuleDebug,
    ModuleEnv,
    ModuleSciter,
    ModuleStorage,
    ModuleSys,
}

impl TrackedFile {
    /// Every tracked file, in declaration order
    pub const ALL: [TrackedFile; 17] = [
        TrackedFile::Element,
        TrackedFile::ElementSelection,
        TrackedFile::ElementState,
        TrackedFile::ElementStyle,
        TrackedFile::Event,
        TrackedFile::Graphics,
        TrackedFile::Node,
        TrackedFile::Window,
        TrackedFile::Behaviors,
        TrackedFile::Document,
        TrackedFile::Global,
        TrackedFile::Jsx,
        TrackedFile::ModuleDebug,
        TrackedFile::ModuleEnv,
        TrackedFile::ModuleSciter,
        TrackedFile::ModuleStorage,
        TrackedFile::ModuleSys,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TrackedFile::Element => "Element.d.ts",
            TrackedFile::ElementSelection => "Element.selection.d.ts",
            TrackedFile::ElementState => "Element.state.d.ts",
            TrackedFile::ElementStyle => "Element.style.d.ts",
            TrackedFile::Event => "Event.d.ts",
            TrackedFile::Graphics => "Graphics.d.ts",
            TrackedFile::Node => "Node.d.ts",
            TrackedFile::Window => "Window.d.ts",
            TrackedFile::Behaviors => "behaviors.d.ts",
            TrackedFile::Document => "document.d.ts",
            TrackedFile::Global => "global.d.ts",
            TrackedFile::Jsx => "jsx.d.ts",
            TrackedFile::ModuleDebug => "module-debug.d.ts",
            TrackedFile::ModuleEnv => "module-env.d.ts",
            TrackedFile::ModuleSciter => "module-sciter.d.ts",
            TrackedFile::ModuleStorage => "module-storage.d.ts",
            TrackedFile::ModuleSys => "module-sys.d.ts",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|file| file.file_name() == name)
    }

    /// Remote location of this file under `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name())
    }
}

impl fmt::Display for TrackedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
