use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Watched source directories.
///
/// Directories may not exist yet when watching starts. They are attached
/// once they appear, and re-attached after being removed and recreated.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    /// Directories nested in another root are dropped, the recursive watch
    /// of the outer one covers them.
    pub(super) fn new(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        paths.dedup();
        let desired = paths
            .iter()
            .filter(|p| !paths.iter().any(|other| other != *p && p.starts_with(other)))
            .cloned()
            .collect();
        Self {
            desired,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn desired(&self) -> &[PathBuf] {
        &self.desired
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "watching {}", path.display());
            }
        }
    }
}
