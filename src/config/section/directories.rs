//! `[directories]` section configuration.
//!
//! ```toml
//! [directories]
//! src = "."              # Application sources, relative to the project root
//! build = "build"        # Production output, relative to the project root
//! pages = "pages"        # Convention files, relative to `src`
//! components = "components"
//! layouts = "layouts"
//! system = "system"      # document / not-found / error overrides
//! # defaults = ".kvikk/defaults"  # where packaged system files are written
//! ```
//!
//! All values must be relative in the file. After loading they are
//! normalized to absolute paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

/// Default location of the packaged system files, relative to the root.
pub const DEFAULTS_DIR: &str = ".kvikk/defaults";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoriesConfig {
    pub src: PathBuf,
    pub build: PathBuf,
    pub components: PathBuf,
    pub layouts: PathBuf,
    pub system: PathBuf,
    pub pages: PathBuf,
    pub defaults: Option<PathBuf>,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("."),
            build: PathBuf::from("build"),
            components: PathBuf::from("components"),
            layouts: PathBuf::from("layouts"),
            system: PathBuf::from("system"),
            pages: PathBuf::from("pages"),
            defaults: None,
        }
    }
}

impl DirectoriesConfig {
    fn entries(&self) -> [(FieldPath, Option<&Path>); 7] {
        [
            (FieldPath::new("directories.src"), Some(self.src.as_path())),
            (FieldPath::new("directories.build"), Some(self.build.as_path())),
            (FieldPath::new("directories.components"), Some(self.components.as_path())),
            (FieldPath::new("directories.layouts"), Some(self.layouts.as_path())),
            (FieldPath::new("directories.system"), Some(self.system.as_path())),
            (FieldPath::new("directories.pages"), Some(self.pages.as_path())),
            (FieldPath::new("directories.defaults"), self.defaults.as_deref()),
        ]
    }

    /// Reject absolute paths. Must run before `normalize`.
    pub fn validate_paths(&self, diag: &mut ConfigDiagnostics) {
        for (field, path) in self.entries() {
            if let Some(path) = path
                && path.is_absolute()
            {
                diag.error_with_hint(
                    field,
                    format!("must be relative, got `{}`", path.display()),
                    "paths are resolved against the project root",
                );
            }
        }
    }

    /// Resolve every directory to an absolute path.
    ///
    /// `src` and `build` are relative to the root, the convention directories
    /// are relative to `src`.
    pub fn normalize(&mut self, root: &Path) {
        self.src = normalize_path(&root.join(&self.src));
        self.build = normalize_path(&root.join(&self.build));

        let src = self.src.clone();
        for dir in [
            &mut self.components,
            &mut self.layouts,
            &mut self.system,
            &mut self.pages,
        ] {
            *dir = normalize_path(&src.join(&*dir));
        }

        let defaults = self
            .defaults
            .take()
            .unwrap_or_else(|| PathBuf::from(DEFAULTS_DIR));
        self.defaults = Some(normalize_path(&root.join(defaults)));
    }

    /// Directory the packaged system files are materialized into.
    pub fn defaults_dir(&self) -> PathBuf {
        self.defaults
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULTS_DIR))
    }
}
