//! Host module resolution for bare specifiers.
//!
//! Resolution walks up from the project root through `node_modules`
//! directories, like Node does:
//!
//! ```text
//! lit                      -> node_modules/lit/<exports["."] | module | main | index.js>
//! @scope/pkg/sub/file.js   -> node_modules/@scope/pkg/<exports["./sub/file.js"] | sub/file.js>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::debug;
use crate::utils::path::is_contained;

const NODE_MODULES: &str = "node_modules";
const PACKAGE_JSON: &str = "package.json";

/// Conditions tried in `exports` maps, in order.
const CONDITIONS: [&str; 4] = ["browser", "import", "module", "default"];

/// A bare specifier split into package name and subpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier<'a> {
    pub package: &'a str,
    /// Empty for the package root.
    pub subpath: &'a str,
}

impl<'a> Specifier<'a> {
    /// Split a bare specifier. Relative, absolute and escaping specifiers
    /// are not bare and yield `None`.
    pub fn parse(specifier: &'a str) -> Option<Self> {
        if specifier.is_empty()
            || specifier.starts_with(['.', '/'])
            || specifier.contains('\\')
            || !is_contained(Path::new(specifier))
        {
            return None;
        }

        let split_at = if specifier.starts_with('@') {
            let scope_end = specifier.find('/')?;
            specifier[scope_end + 1..]
                .find('/')
                .map(|i| scope_end + 1 + i)
        } else {
            specifier.find('/')
        };

        let (package, subpath) = match split_at {
            Some(i) => (&specifier[..i], &specifier[i + 1..]),
            None => (specifier, ""),
        };
        if package.ends_with('/') || package.is_empty() {
            return None;
        }
        Some(Self { package, subpath })
    }
}

/// Resolve `specifier` to an entry file, searching from `root` upward.
pub fn resolve_module(root: &Path, specifier: &str) -> Option<PathBuf> {
    let spec = Specifier::parse(specifier)?;
    root.ancestors()
        .map(|dir| dir.join(NODE_MODULES).join(spec.package))
        .find(|dir| dir.is_dir())
        .and_then(|package_dir| resolve_in_package(&package_dir, spec.subpath))
}

fn resolve_in_package(package_dir: &Path, subpath: &str) -> Option<PathBuf> {
    let manifest = read_manifest(package_dir);

    if let Some(exports) = manifest.as_ref().and_then(|m| m.get("exports")) {
        let key = if subpath.is_empty() {
            ".".to_string()
        } else {
            format!("./{subpath}")
        };
        // An `exports` field seals the package: unlisted subpaths are private.
        return export_target(exports, &key).and_then(|target| package_file(package_dir, target));
    }

    if subpath.is_empty() {
        let fields = ["module", "main"];
        let from_fields = manifest.as_ref().and_then(|m| {
            fields
                .iter()
                .filter_map(|field| m.get(*field).and_then(Value::as_str))
                .find_map(|target| package_file(package_dir, target))
        });
        return from_fields.or_else(|| package_file(package_dir, "index.js"));
    }

    package_file(package_dir, subpath)
}

fn read_manifest(package_dir: &Path) -> Option<Value> {
    let path = package_dir.join(PACKAGE_JSON);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("bundle"; "ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

/// Target of `key` in an `exports` field.
///
/// Handles the shorthand forms: a string or a bare condition map stand for
/// the `"."` entry only.
fn export_target<'v>(exports: &'v Value, key: &str) -> Option<&'v str> {
    match exports {
        Value::String(_) | Value::Array(_) => (key == ".").then(|| conditional(exports)).flatten(),
        Value::Object(map) => {
            let has_subpaths = map.keys().any(|k| k.starts_with('.'));
            if has_subpaths {
                map.get(key).and_then(conditional)
            } else if key == "." {
                conditional(exports)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn conditional(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(conditional),
        Value::Object(map) => CONDITIONS
            .iter()
            .filter_map(|c| map.get(*c))
            .find_map(conditional),
        _ => None,
    }
}

/// A file inside the package, trying `.js` and `index.js` completions.
fn package_file(package_dir: &Path, target: &str) -> Option<PathBuf> {
    let relative = target.strip_prefix("./").unwrap_or(target);
    if relative.is_empty() || !is_contained(Path::new(relative)) {
        return None;
    }
    let path = package_dir.join(relative);
    let candidates = [
        path.clone(),
        path.with_extension("js"),
        path.join("index.js"),
    ];
    candidates.into_iter().find(|p| p.is_file())
}
