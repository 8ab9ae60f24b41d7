//! Route entries.

use std::path::PathBuf;

use serde::Serialize;

use super::{Capabilities, ContentHash, RouteKind};

/// One discovered convention file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// Canonical path of the convention file.
    pub source: PathBuf,
    /// URL pattern including the base path, e.g. `/blog/:slug`.
    pub pattern: String,
    pub kind: RouteKind,
    pub hash: ContentHash,
    /// True only for pages: the entry also produces a client bundle.
    pub bundle: bool,
    pub capabilities: Capabilities,
}

impl RouteEntry {
    pub fn new(
        source: PathBuf,
        pattern: String,
        kind: RouteKind,
        seed: Option<&str>,
        capabilities: Capabilities,
    ) -> Self {
        let hash = ContentHash::for_route(&pattern, kind, seed);
        Self {
            source,
            pattern,
            kind,
            hash,
            bundle: kind.is_bundle_eligible(),
            capabilities,
        }
    }

    /// Output file name of the entry's client bundle.
    pub fn bundle_file_name(&self) -> String {
        format!("{}.js", self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_hash_and_bundle() {
        let page = RouteEntry::new(
            PathBuf::from("/app/pages/blog/[slug]/page.js"),
            "/blog/:slug".into(),
            RouteKind::Page,
            None,
            Capabilities::default(),
        );
        assert!(page.bundle);
        assert_eq!(page.hash, ContentHash::of("/blog/:slug:page"));
        assert_eq!(page.bundle_file_name(), format!("{}.js", page.hash));

        let action = RouteEntry::new(
            PathBuf::from("/app/pages/blog/[slug]/action.js"),
            "/blog/:slug".into(),
            RouteKind::Action,
            None,
            Capabilities::default(),
        );
        assert!(!action.bundle);
        assert_ne!(page.hash, action.hash);
    }
}
