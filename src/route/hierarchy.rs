//! The authoritative route registry.
//!
//! A scan builds a complete `RouteTable` off to the side and swaps it in
//! atomically, so readers see either the previous table or the new one,
//! never a partially filled map. A failed scan leaves the previous table
//! in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::conflict::detect_conflicts;
use super::scan::Scanner;
use super::{ContentHash, HierarchyError, RouteEntry, RouteKind};
use crate::config::AppConfig;
use crate::system::{OverrideMemo, SystemFile, resolve_override};
use crate::utils::path::normalize_path;
use crate::utils::plural::plural_count;
use crate::{debug, log};

// ============================================================================
// RouteTable
// ============================================================================

/// Immutable snapshot of one scan.
#[derive(Debug, Default)]
pub struct RouteTable {
    by_hash: FxHashMap<ContentHash, Arc<RouteEntry>>,
    by_source: FxHashMap<PathBuf, ContentHash>,
    generation: u64,
}

impl RouteTable {
    /// Index entries. Callers must have rejected conflicts first.
    fn new(entries: Vec<RouteEntry>, generation: u64) -> Self {
        let mut by_hash = FxHashMap::default();
        let mut by_source = FxHashMap::default();
        for entry in entries {
            by_source.insert(entry.source.clone(), entry.hash);
            by_hash.insert(entry.hash, Arc::new(entry));
        }
        Self {
            by_hash,
            by_source,
            generation,
        }
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&Arc<RouteEntry>> {
        self.by_hash.get(hash)
    }

    pub fn get_by_source(&self, source: &Path) -> Option<&Arc<RouteEntry>> {
        self.by_source
            .get(source)
            .and_then(|hash| self.by_hash.get(hash))
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Number of the scan that produced this table, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Entries ordered by pattern, then kind.
    pub fn entries(&self) -> Vec<Arc<RouteEntry>> {
        let mut entries: Vec<_> = self.by_hash.values().cloned().collect();
        entries.sort_by(|a, b| a.pattern.cmp(&b.pattern).then(a.kind.cmp(&b.kind)));
        entries
    }

    /// Page entries, ordered like `entries`.
    pub fn bundle_entries(&self) -> Vec<Arc<RouteEntry>> {
        self.entries().into_iter().filter(|e| e.bundle).collect()
    }

    pub fn count(&self, kind: RouteKind) -> usize {
        self.by_hash.values().filter(|e| e.kind == kind).count()
    }
}

// ============================================================================
// RouteHierarchy
// ============================================================================

/// Directories and naming inputs of a hierarchy.
#[derive(Debug, Clone)]
pub struct HierarchyOptions {
    /// Project root, used to shorten paths in reports.
    pub root: PathBuf,
    pub pages_dir: PathBuf,
    pub system_dir: PathBuf,
    pub defaults_dir: PathBuf,
    pub base: String,
    pub seed: Option<String>,
}

impl HierarchyOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            root: config.root.clone(),
            pages_dir: config.directories.pages.clone(),
            system_dir: config.directories.system.clone(),
            defaults_dir: config.directories.defaults_dir(),
            base: config.paths.base.clone(),
            seed: config.bundler.seed().map(str::to_string),
        }
    }
}

/// Route registry plus the resolved system file overrides.
#[derive(Debug)]
pub struct RouteHierarchy {
    scanner: Scanner,
    root: PathBuf,
    system_dir: PathBuf,
    defaults_dir: PathBuf,
    table: ArcSwap<RouteTable>,
    overrides: Mutex<OverrideMemo>,
    scans: AtomicU64,
}

impl RouteHierarchy {
    /// Create an empty hierarchy. Nothing is read until `scan`.
    pub fn new(options: HierarchyOptions) -> Self {
        Self {
            scanner: Scanner::new(
                options.pages_dir,
                options.base,
                options.seed.as_deref(),
            ),
            root: options.root,
            system_dir: options.system_dir,
            defaults_dir: options.defaults_dir,
            table: ArcSwap::from_pointee(RouteTable::default()),
            overrides: Mutex::new(OverrideMemo::default()),
            scans: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(HierarchyOptions::from_config(config))
    }

    pub fn pages_dir(&self) -> &Path {
        self.scanner.pages_dir()
    }

    /// Rebuild the registry from the pages root.
    ///
    /// Conflicting identifiers and ambiguous overrides abort the scan with a
    /// configuration error. The system file overrides are re-resolved so a
    /// re-scan picks up added or removed override files.
    pub async fn scan(&self) -> Result<Arc<RouteTable>, HierarchyError> {
        let scanner = self.scanner.clone();
        let entries = tokio::task::spawn_blocking(move || {
            scanner.entries().collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| HierarchyError::Join(e.to_string()))??;

        let conflicts = detect_conflicts(&entries, &self.root);
        if !conflicts.is_empty() {
            return Err(HierarchyError::Conflict(conflicts));
        }

        let mut memo = OverrideMemo::default();
        for file in SystemFile::ALL {
            memo.set(file, self.resolve_uncached(file).await?);
        }

        let generation = self.scans.fetch_add(1, Ordering::SeqCst) + 1;
        let table = Arc::new(RouteTable::new(entries, generation));
        self.table.store(Arc::clone(&table));
        *self.overrides.lock() = memo;

        debug!("routes"; "scan #{} found {}", generation, plural_count(table.len(), "route"));
        Ok(table)
    }

    /// Current table.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Entry for a public identifier. Malformed identifiers are not found.
    pub fn lookup_by_hash(&self, hash: &str) -> Option<Arc<RouteEntry>> {
        let hash = ContentHash::from_hex(hash)?;
        self.lookup(&hash)
    }

    pub fn lookup(&self, hash: &ContentHash) -> Option<Arc<RouteEntry>> {
        self.table.load().get(hash).cloned()
    }

    /// Entry whose convention file is `source`.
    ///
    /// Relative or non-canonical paths are normalized before a second try.
    pub fn lookup_by_source(&self, source: &Path) -> Option<Arc<RouteEntry>> {
        let table = self.table.load();
        table
            .get_by_source(source)
            .or_else(|| table.get_by_source(&normalize_path(source)))
            .cloned()
    }

    /// Sources of every page, the input list of a production bundle pass.
    pub fn bundle_entries(&self) -> Vec<PathBuf> {
        self.table
            .load()
            .bundle_entries()
            .into_iter()
            .map(|e| e.source.clone())
            .collect()
    }

    pub async fn resolve_document(&self) -> Result<PathBuf, HierarchyError> {
        self.resolve_system(SystemFile::Document).await
    }

    pub async fn resolve_not_found(&self) -> Result<PathBuf, HierarchyError> {
        self.resolve_system(SystemFile::NotFound).await
    }

    pub async fn resolve_error(&self) -> Result<PathBuf, HierarchyError> {
        self.resolve_system(SystemFile::Error).await
    }

    /// Memoized override resolution.
    pub async fn resolve_system(&self, file: SystemFile) -> Result<PathBuf, HierarchyError> {
        if let Some(source) = self.overrides.lock().get(file) {
            return Ok(source.clone());
        }
        let source = self.resolve_uncached(file).await?;
        self.overrides.lock().set(file, source.clone());
        Ok(source)
    }

    async fn resolve_uncached(&self, file: SystemFile) -> Result<PathBuf, HierarchyError> {
        let resolved = resolve_override(&self.system_dir, file, &self.defaults_dir).await?;
        for err in &resolved.probe_errors {
            log!("system"; "{}: {}, using packaged `{}`", err, err.source, file);
        }
        debug!("system"; "{} -> {}", file, resolved.source.display());
        Ok(resolved.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::HttpMethod;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = normalize_path(temp.path());
            fs::create_dir_all(root.join("pages")).unwrap();
            Self { _temp: temp, root }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn options(&self) -> HierarchyOptions {
            HierarchyOptions {
                root: self.root.clone(),
                pages_dir: self.root.join("pages"),
                system_dir: self.root.join("system"),
                defaults_dir: self.root.join(".kvikk/defaults"),
                base: "/".into(),
                seed: None,
            }
        }

        fn hierarchy(&self) -> RouteHierarchy {
            RouteHierarchy::new(self.options())
        }

        fn blog_app(&self) {
            self.write("pages/page.js", "export default () => 'home';");
            self.write("pages/blog/[slug]/page.js", "export default () => 'post';");
            self.write(
                "pages/api/[id]/route.js",
                "export async function GET() {}\nexport async function POST() {}",
            );
        }
    }

    #[tokio::test]
    async fn test_empty_until_scanned() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        assert!(hierarchy.snapshot().is_empty());
        assert_eq!(hierarchy.snapshot().generation(), 0);
    }

    #[tokio::test]
    async fn test_scan_blog_app() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        let table = hierarchy.scan().await.unwrap();

        assert_eq!(table.len(), 3);
        let entries = table.entries();
        let patterns: Vec<_> = entries.iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["/", "/api/:id", "/blog/:slug"]);

        let blog = &entries[2];
        assert_eq!(blog.kind, RouteKind::Page);
        assert!(blog.bundle);
        assert_eq!(blog.hash, ContentHash::of("/blog/:slug:page"));

        let api = &entries[1];
        assert_eq!(api.kind, RouteKind::DataRoute);
        assert!(!api.bundle);
        assert_eq!(
            api.capabilities.methods,
            vec![HttpMethod::Get, HttpMethod::Post]
        );
    }

    #[tokio::test]
    async fn test_lookup_by_hash() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();

        let hash = ContentHash::of("/blog/:slug:page").to_string();
        let entry = hierarchy.lookup_by_hash(&hash).unwrap();
        assert_eq!(entry.pattern, "/blog/:slug");

        assert!(hierarchy.lookup_by_hash("0000000000000000").is_none());
        assert!(hierarchy.lookup_by_hash("not-a-hash").is_none());
    }

    #[tokio::test]
    async fn test_lookup_by_source() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();

        let source = fx.root.join("pages/blog/[slug]/page.js");
        let entry = hierarchy.lookup_by_source(&source).unwrap();
        assert_eq!(entry.pattern, "/blog/:slug");

        let dotted = fx.root.join("pages/blog/./[slug]/page.js");
        assert!(hierarchy.lookup_by_source(&dotted).is_some());
        assert!(hierarchy.lookup_by_source(&fx.root.join("pages/nope/page.js")).is_none());
    }

    #[tokio::test]
    async fn test_bundle_entries_are_pages() {
        let fx = Fixture::new();
        fx.blog_app();
        fx.write("pages/blog/[slug]/action.js", "export default async () => {};");
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();

        let bundles = hierarchy.bundle_entries();
        assert_eq!(bundles.len(), 2);
        assert!(bundles.iter().all(|p| p.ends_with("page.js")));
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();

        let first = hierarchy.scan().await.unwrap();
        let second = hierarchy.scan().await.unwrap();
        assert_eq!(first.entries(), second.entries());
        assert_eq!(second.generation(), 2);
    }

    #[tokio::test]
    async fn test_rescan_after_add_is_superset() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        let before = hierarchy.scan().await.unwrap();

        fx.write("pages/about/page.ts", "export default () => 'about';");
        let after = hierarchy.scan().await.unwrap();

        assert_eq!(after.len(), before.len() + 1);
        for entry in before.entries() {
            assert_eq!(after.get(&entry.hash), Some(&entry));
        }
    }

    #[tokio::test]
    async fn test_rescan_after_remove() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();

        fs::remove_file(fx.root.join("pages/blog/[slug]/page.js")).unwrap();
        let table = hierarchy.scan().await.unwrap();
        assert_eq!(table.len(), 2);
        assert!(hierarchy.lookup(&ContentHash::of("/blog/:slug:page")).is_none());
    }

    #[tokio::test]
    async fn test_duplicate_route_is_fatal_and_keeps_table() {
        let fx = Fixture::new();
        fx.blog_app();
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();

        fx.write("pages/blog/[slug]/page.ts", "export default () => 'dup';");
        let err = hierarchy.scan().await.unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(&err, HierarchyError::Conflict(c) if c.len() == 1));
        assert!(err.to_string().contains("duplicate route"));

        assert_eq!(hierarchy.snapshot().len(), 3);
        assert_eq!(hierarchy.snapshot().generation(), 1);
    }

    #[tokio::test]
    async fn test_resolve_system_defaults() {
        let fx = Fixture::new();
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();

        let document = hierarchy.resolve_document().await.unwrap();
        assert!(document.ends_with("system/document.js"));
        assert!(document.starts_with(fx.root.join(".kvikk/defaults")));

        let not_found = hierarchy.resolve_not_found().await.unwrap();
        assert!(not_found.ends_with("system/not-found.js"));
        let error = hierarchy.resolve_error().await.unwrap();
        assert!(error.ends_with("system/error.js"));
    }

    #[tokio::test]
    async fn test_resolve_system_memoized_until_rescan() {
        let fx = Fixture::new();
        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();
        let before = hierarchy.resolve_document().await.unwrap();

        fx.write("system/document.js", "export default () => '';");
        assert_eq!(hierarchy.resolve_document().await.unwrap(), before);

        hierarchy.scan().await.unwrap();
        assert_eq!(
            hierarchy.resolve_document().await.unwrap(),
            fx.root.join("system/document.js")
        );
    }

    #[tokio::test]
    async fn test_resolve_without_scan() {
        let fx = Fixture::new();
        fx.write("system/error.ts", "export default () => '';");
        let hierarchy = fx.hierarchy();
        assert_eq!(
            hierarchy.resolve_error().await.unwrap(),
            fx.root.join("system/error.ts")
        );
    }

    #[tokio::test]
    async fn test_ambiguous_override_aborts_scan() {
        let fx = Fixture::new();
        fx.blog_app();
        fx.write("system/not-found.js", "");
        fx.write("system/not-found.ts", "");
        let hierarchy = fx.hierarchy();

        let err = hierarchy.scan().await.unwrap_err();
        assert!(err.is_configuration());
        assert!(hierarchy.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_system_dir_uses_defaults() {
        let fx = Fixture::new();
        fx.blog_app();
        fx.write("system", "not a directory");

        let hierarchy = fx.hierarchy();
        hierarchy.scan().await.unwrap();
        let document = hierarchy.resolve_document().await.unwrap();
        assert!(document.starts_with(fx.root.join(".kvikk/defaults")));
    }

    #[tokio::test]
    async fn test_relative_pages_dir_scan() {
        let fx = Fixture::new();
        fx.blog_app();

        let cwd = std::env::current_dir().unwrap();
        let up: PathBuf = cwd.components().skip(1).map(|_| Path::new("..")).collect();
        let relative = up.join(fx.root.strip_prefix("/").unwrap()).join("pages");

        let hierarchy = RouteHierarchy::new(HierarchyOptions {
            pages_dir: relative,
            ..fx.options()
        });
        let table = hierarchy.scan().await.unwrap();
        assert_eq!(table.len(), 3);

        let post = hierarchy
            .lookup_by_source(&fx.root.join("pages/blog/[slug]/page.js"))
            .unwrap();
        assert_eq!(post.pattern, "/blog/:slug");
        assert_eq!(post.hash, ContentHash::for_route("/blog/:slug", RouteKind::Page, None));
    }
}
