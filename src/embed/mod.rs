//! Packaged default system files.
//!
//! The default `document`, `not-found` and `error` modules are compiled into
//! the binary and materialized under `<defaults>/system/` so the compiler
//! and the HTTP layer can load them like any user file.
//!
//! ```ignore
//! let written = embed::write_system_defaults(&defaults_dir, &SystemVars::new("Shop"))?;
//! ```

mod template;

pub use template::{Template, TemplateVars};

use std::io;
use std::path::{Path, PathBuf};

use crate::system::{SYSTEM_SUBDIR, SystemFile};

/// Variables injected into the packaged system files.
pub struct SystemVars {
    pub app_name: String,
}

impl SystemVars {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl TemplateVars for SystemVars {
    fn apply(&self, content: &str) -> String {
        content.replace("__APP_NAME__", &self.app_name)
    }
}

pub const DOCUMENT_JS: Template<SystemVars> = Template::new(include_str!("system/document.js"));
pub const NOT_FOUND_JS: Template<SystemVars> = Template::new(include_str!("system/not-found.js"));
pub const ERROR_JS: Template<SystemVars> = Template::new(include_str!("system/error.js"));

/// Embedded template of a system file.
pub const fn template_for(file: SystemFile) -> &'static Template<SystemVars> {
    match file {
        SystemFile::Document => &DOCUMENT_JS,
        SystemFile::NotFound => &NOT_FOUND_JS,
        SystemFile::Error => &ERROR_JS,
    }
}

/// Write the packaged system files into `<defaults_dir>/system/`.
///
/// Files whose content is already current are left untouched so their
/// mtime does not trigger watchers. Returns the paths that were written.
pub fn write_system_defaults(defaults_dir: &Path, vars: &SystemVars) -> io::Result<Vec<PathBuf>> {
    let dir = defaults_dir.join(SYSTEM_SUBDIR);
    std::fs::create_dir_all(&dir)?;

    let mut written = Vec::new();
    for file in SystemFile::ALL {
        let path = file.packaged_path(defaults_dir);
        let content = template_for(file).render(vars);
        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
            continue;
        }
        std::fs::write(&path, content)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_templates_render_name() {
        let vars = SystemVars::new("Shop");
        for file in SystemFile::ALL {
            let rendered = template_for(file).render(&vars);
            assert!(rendered.contains("Shop"), "{file:?}");
            assert!(!rendered.contains("__APP_NAME__"));
            assert!(rendered.contains("export default"));
        }
    }

    #[test]
    fn test_write_system_defaults_once() {
        let temp = TempDir::new().unwrap();
        let vars = SystemVars::new("Shop");

        let written = write_system_defaults(temp.path(), &vars).unwrap();
        assert_eq!(written.len(), 3);
        assert!(temp.path().join("system/document.js").is_file());
        assert!(temp.path().join("system/not-found.js").is_file());
        assert!(temp.path().join("system/error.js").is_file());

        let again = write_system_defaults(temp.path(), &vars).unwrap();
        assert!(again.is_empty());

        let renamed = write_system_defaults(temp.path(), &SystemVars::new("Store")).unwrap();
        assert_eq!(renamed.len(), 3);
    }
}
