//! Convention file discovery.
//!
//! Walks the pages root for `page`, `route` and `action` files with a
//! `.js` or `.ts` extension. Anything else is ignored.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::capability::{Capabilities, analyze_exports, find_sibling_middleware};
use super::pattern::route_for_dir;
use super::{HierarchyError, RouteEntry, RouteKind};
use crate::log;
use crate::utils::path::normalize_path;

/// Builds route entries from a pages root.
#[derive(Debug, Clone)]
pub struct Scanner {
    pages_dir: PathBuf,
    base: String,
    seed: Option<String>,
}

impl Scanner {
    pub fn new(pages_dir: impl Into<PathBuf>, base: impl Into<String>, seed: Option<&str>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            base: base.into(),
            seed: seed.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Convention files under the pages root, in path order.
    ///
    /// The root is made absolute first, so every yielded path lies under
    /// `normalize_path(pages_dir)`. A missing pages root yields nothing. The
    /// iterator is lazy and can be restarted by calling `discover` again.
    pub fn discover(&self) -> impl Iterator<Item = Result<(PathBuf, RouteKind), HierarchyError>> + '_ {
        let root = normalize_path(&self.pages_dir);
        let walk = root.is_dir().then(|| WalkDir::new(&root).sort(true));

        walk.into_iter().flatten().filter_map(move |item| match item {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.path();
                RouteKind::from_path(&path).map(|kind| Ok((path, kind)))
            }
            Ok(_) => None,
            Err(err) => Some(Err(HierarchyError::Walk {
                path: self.pages_dir.clone(),
                message: err.to_string(),
            })),
        })
    }

    /// Route entries for every convention file, built lazily.
    pub fn entries(&self) -> impl Iterator<Item = Result<RouteEntry, HierarchyError>> + '_ {
        let root = normalize_path(&self.pages_dir);
        self.discover()
            .map(move |found| {
                found.and_then(|(path, kind)| self.build_entry(&root, &path, kind))
            })
    }

    /// Read and analyze one convention file found under `root`.
    fn build_entry(
        &self,
        root: &Path,
        path: &Path,
        kind: RouteKind,
    ) -> Result<RouteEntry, HierarchyError> {
        let relative_dir = path
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .ok_or_else(|| HierarchyError::OutsideRoot {
                path: path.to_path_buf(),
                root: root.to_path_buf(),
            })?;
        let pattern = route_for_dir(relative_dir, &self.base);

        let source_text = std::fs::read_to_string(path).map_err(|source| HierarchyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let exports = analyze_exports(path, &source_text)?;
        for specifier in &exports.opaque {
            log!(
                "warning";
                "`{}`: exports of `export * from '{}'` are not known until runtime",
                path.display(),
                specifier
            );
        }

        let source = normalize_path(path);
        let capabilities =
            Capabilities::from_exports(kind, exports, find_sibling_middleware(&source));

        Ok(RouteEntry::new(
            source,
            pattern,
            kind,
            self.seed.as_deref(),
            capabilities,
        ))
    }
}
