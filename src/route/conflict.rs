//! Identifier conflict detection for route entries.
//!
//! Every entry must own its hash. A conflict is either a duplicate route
//! (two files for the same pattern and kind, like `page.js` next to
//! `page.ts`) or a true hash collision between different routes.

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::{ContentHash, RouteEntry, RouteKind};

/// Hash → entries claiming it.
pub type HashSourceMap<'a> = FxHashMap<ContentHash, Vec<&'a RouteEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Same pattern and kind from more than one file.
    Duplicate,
    /// Different routes share a hash.
    Collision,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => f.write_str("duplicate route"),
            Self::Collision => f.write_str("hash collision"),
        }
    }
}

/// One side of a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingRoute {
    pub pattern: String,
    pub kind: RouteKind,
    /// Source path relative to the project root
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub hash: ContentHash,
    pub kind: ConflictKind,
    pub routes: Vec<ConflictingRoute>,
}

/// Group entries by hash.
pub fn collect_hash_sources(entries: &[RouteEntry]) -> HashSourceMap<'_> {
    let mut map = HashSourceMap::default();
    for entry in entries {
        map.entry(entry.hash).or_default().push(entry);
    }
    map
}

/// Find every hash claimed by more than one entry.
///
/// Results are sorted by hash so reports are stable across runs.
pub fn detect_conflicts(entries: &[RouteEntry], root: &Path) -> Vec<RouteConflict> {
    let mut conflicts: Vec<_> = collect_hash_sources(entries)
        .into_iter()
        .filter(|(_, claims)| claims.len() > 1)
        .map(|(hash, claims)| {
            let first = claims[0];
            let same_route = claims
                .iter()
                .all(|e| e.pattern == first.pattern && e.kind == first.kind);
            RouteConflict {
                hash,
                kind: if same_route {
                    ConflictKind::Duplicate
                } else {
                    ConflictKind::Collision
                },
                routes: claims
                    .into_iter()
                    .map(|e| ConflictingRoute {
                        pattern: e.pattern.clone(),
                        kind: e.kind,
                        source: e.source.strip_prefix(root).unwrap_or(&e.source).to_path_buf(),
                    })
                    .collect(),
            }
        })
        .collect();

    conflicts.sort_by_key(|c| c.hash);
    conflicts
}

/// Format conflicts as a string (for error messages).
///
/// ```text
/// duplicate route 3f2a9c0d1e4b5a67
///   - /blog/:slug [page] pages/blog/[slug]/page.js
///   - /blog/:slug [page] pages/blog/[slug]/page.ts
/// ```
pub fn format_conflicts(conflicts: &[RouteConflict]) -> String {
    conflicts
        .iter()
        .map(format_single_conflict)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_single_conflict(conflict: &RouteConflict) -> String {
    let mut lines = vec![format!("{} {}", conflict.kind, conflict.hash)];
    for route in &conflict.routes {
        lines.push(format!(
            "  - {} [{}] {}",
            route.pattern,
            route.kind,
            route.source.display()
        ));
    }
    lines.join("\n")
}
