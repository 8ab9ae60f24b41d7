//! Production pass.
//!
//! Phases:
//! - **Scan** - Rebuild the route table
//! - **Defaults** - Materialize the packaged system files
//! - **Pages** - One compiler run over every page, `<hash>.js` per entry
//! - **Verify** - Map every emitted entry chunk back to its route
//! - **Modules** - Pre-bundle the configured third-party modules
//! - **Manifest** - `manifest.json` describing every route
//!
//! Output layout under `<build><js>`:
//!
//! ```text
//! pages/<hash>.js
//! pages/chunks/...        # shared chunks when splitting is on
//! modules/<specifier>.js
//! manifest.json
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Serialize;
use thiserror::Error;

use super::asset::AssetKind;
use super::compiler::{BundleRequest, CompileError, ModuleCompiler, NamedEntry, OutputFile};
use super::gateway::{module_file_name, output_dir};
use super::resolve::resolve_module;
use crate::config::AppConfig;
use crate::embed::{SystemVars, write_system_defaults};
use crate::route::{HierarchyError, HttpMethod, RouteHierarchy, RouteKind, RouteTable};
use crate::utils::plural::plural_count;
use crate::{debug, log};

pub const MANIFEST: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("module `{0}` not found in node_modules")]
    ModuleNotFound(String),

    #[error("page `{}` produced no output", .0.display())]
    MissingOutput(PathBuf),

    #[error("failed to write `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a production pass wrote.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub routes: usize,
    pub pages: usize,
    pub modules: usize,
    pub manifest: PathBuf,
}

/// One route in `manifest.json`.
#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    pattern: &'a str,
    kind: RouteKind,
    source: PathBuf,
    methods: &'a [HttpMethod],
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle: Option<String>,
}

/// Run the production pass.
pub async fn build_production<C: ModuleCompiler>(
    config: &AppConfig,
    hierarchy: &RouteHierarchy,
    compiler: &C,
) -> Result<BuildReport, BuildError> {
    let table = hierarchy.scan().await?;
    let out = output_dir(config);

    let defaults = config.directories.defaults_dir();
    let written = write_system_defaults(&defaults, &SystemVars::new(&config.application.name))
        .map_err(BuildError::io(&defaults))?;
    debug!("build"; "system defaults: {} written", plural_count(written.len(), "file"));

    let pages = build_pages(hierarchy, &table, compiler, &out).await?;
    let modules = build_modules(config, compiler, &out).await?;
    let manifest = write_manifest(config, &table, &out)?;

    log!(
        "build"; "{}, {}, {} -> {}",
        plural_count(table.len(), "route"),
        plural_count(pages, "page bundle"),
        plural_count(modules, "module"),
        config.root_relative(&out).display()
    );

    Ok(BuildReport {
        output_dir: out,
        routes: table.len(),
        pages,
        modules,
        manifest,
    })
}

async fn build_pages<C: ModuleCompiler>(
    hierarchy: &RouteHierarchy,
    table: &RouteTable,
    compiler: &C,
    out: &Path,
) -> Result<usize, BuildError> {
    let pages_dir = out.join(AssetKind::Page.dir());
    if pages_dir.exists() {
        fs::remove_dir_all(&pages_dir).map_err(BuildError::io(&pages_dir))?;
    }
    fs::create_dir_all(&pages_dir).map_err(BuildError::io(&pages_dir))?;

    let entries: Vec<NamedEntry> = table
        .bundle_entries()
        .iter()
        .map(|e| NamedEntry::page(&e.hash, e.source.clone()))
        .collect();
    if entries.is_empty() {
        return Ok(0);
    }

    let outputs = compiler.bundle_all(&entries, &pages_dir).await?;
    let built = verify_outputs(hierarchy, &outputs)?;

    if let Some(missing) = entries.iter().find(|e| !built.contains(&e.source)) {
        return Err(BuildError::MissingOutput(missing.source.clone()));
    }
    Ok(built.len())
}

/// Check that every entry chunk belongs to a page and carries its hash.
///
/// Returns the sources of the verified pages.
fn verify_outputs(
    hierarchy: &RouteHierarchy,
    outputs: &[OutputFile],
) -> Result<FxHashSet<PathBuf>, CompileError> {
    let mut built = FxHashSet::default();
    for output in outputs {
        let Some(source) = &output.entry else {
            continue;
        };
        let unmapped = || CompileError::UnmappedOutput {
            output: output.path.clone(),
        };

        let entry = hierarchy
            .lookup_by_source(source)
            .filter(|e| e.bundle)
            .ok_or_else(unmapped)?;
        let file_name = output.path.file_name().and_then(|n| n.to_str());
        if file_name != Some(entry.bundle_file_name().as_str()) {
            return Err(unmapped());
        }
        built.insert(entry.source.clone());
    }
    Ok(built)
}

async fn build_modules<C: ModuleCompiler>(
    config: &AppConfig,
    compiler: &C,
    out: &Path,
) -> Result<usize, BuildError> {
    let modules_dir = out.join(AssetKind::Module.dir());
    for specifier in &config.bundler.modules {
        let entry = resolve_module(&config.root, specifier)
            .ok_or_else(|| BuildError::ModuleNotFound(specifier.clone()))?;
        let body = compiler
            .bundle(&BundleRequest {
                entry,
                generation: 0,
            })
            .await?;

        let path = modules_dir.join(module_file_name(specifier));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
        }
        fs::write(&path, body).map_err(BuildError::io(&path))?;
        debug!("build"; "module {} -> {}", specifier, config.root_relative(&path).display());
    }
    Ok(config.bundler.modules.len())
}

fn write_manifest(config: &AppConfig, table: &RouteTable, out: &Path) -> Result<PathBuf, BuildError> {
    let entries = table.entries();
    let mut manifest = serde_json::Map::new();
    for entry in &entries {
        let record = ManifestEntry {
            pattern: &entry.pattern,
            kind: entry.kind,
            source: config.root_relative(&entry.source),
            methods: &entry.capabilities.methods,
            bundle: entry
                .bundle
                .then(|| format!("{}/{}", AssetKind::Page.dir(), entry.bundle_file_name())),
        };
        // Serializing plain strings and enums cannot fail.
        let value = serde_json::to_value(record).unwrap_or_default();
        manifest.insert(entry.hash.to_string(), value);
    }

    let path = out.join(MANIFEST);
    fs::create_dir_all(out).map_err(BuildError::io(out))?;
    let content = serde_json::to_string_pretty(&manifest).unwrap_or_default();
    fs::write(&path, content).map_err(BuildError::io(&path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::compiler::testing::InlineCompiler;
    use crate::config::test_config_at;
    use crate::route::ContentHash;
    use crate::utils::path::normalize_path;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = normalize_path(temp.path());
            Self { _temp: temp, root }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn config(&self, extra: &str) -> AppConfig {
            test_config_at(&self.root, extra)
        }
    }

    fn blog_app(fx: &Fixture) {
        fx.write("pages/page.js", "export default () => 'home';");
        fx.write("pages/blog/[slug]/page.ts", "export default () => 'post';");
        fx.write("pages/login/action.js", "export async function POST() {}");
    }

    #[tokio::test]
    async fn test_build_writes_hashed_pages_and_manifest() {
        let fx = Fixture::new();
        blog_app(&fx);
        let config = fx.config("");
        let hierarchy = RouteHierarchy::from_config(&config);
        let compiler = InlineCompiler::default();

        let report = build_production(&config, &hierarchy, &compiler).await.unwrap();

        assert_eq!(report.routes, 3);
        assert_eq!(report.pages, 2);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);

        let home = ContentHash::for_route("/", RouteKind::Page, None);
        let page = fx.root.join(format!("build/js/pages/{home}.js"));
        assert!(fs::read_to_string(page).unwrap().contains("home"));

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report.manifest).unwrap()).unwrap();
        let record = &manifest[home.to_string()];
        assert_eq!(record["pattern"], "/");
        assert_eq!(record["kind"], "page");
        assert_eq!(record["methods"][0], "GET");
        assert_eq!(record["bundle"], format!("pages/{home}.js"));

        let login = ContentHash::for_route("/login", RouteKind::Action, None);
        assert_eq!(manifest[login.to_string()]["methods"][0], "POST");
        assert!(manifest[login.to_string()].get("bundle").is_none());
    }

    #[tokio::test]
    async fn test_build_materializes_system_defaults() {
        let fx = Fixture::new();
        blog_app(&fx);
        let config = fx.config("[application]\nname = \"Shop\"");
        let hierarchy = RouteHierarchy::from_config(&config);

        build_production(&config, &hierarchy, &InlineCompiler::default())
            .await
            .unwrap();

        let document = hierarchy.resolve_document().await.unwrap();
        assert!(document.ends_with("system/document.js"));
        assert!(fs::read_to_string(document).unwrap().contains("Shop"));
    }

    #[tokio::test]
    async fn test_build_removes_stale_pages() {
        let fx = Fixture::new();
        blog_app(&fx);
        fx.write("build/js/pages/0000000000000000.js", "stale");
        let config = fx.config("");
        let hierarchy = RouteHierarchy::from_config(&config);

        build_production(&config, &hierarchy, &InlineCompiler::default())
            .await
            .unwrap();

        assert!(!fx.root.join("build/js/pages/0000000000000000.js").exists());
    }

    #[tokio::test]
    async fn test_build_prebundles_modules() {
        let fx = Fixture::new();
        blog_app(&fx);
        fx.write("node_modules/lit/index.js", "export class LitElement {}");
        fx.write(
            "node_modules/@lit-labs/ssr-client/package.json",
            r#"{"exports": {"./hydrate.js": "./hydrate.js"}}"#,
        );
        fx.write("node_modules/@lit-labs/ssr-client/hydrate.js", "export const hydrate = 1;");
        let config = fx.config(
            "[bundler]\nmodules = [\"lit\", \"@lit-labs/ssr-client/hydrate.js\"]",
        );
        let hierarchy = RouteHierarchy::from_config(&config);

        let report = build_production(&config, &hierarchy, &InlineCompiler::default())
            .await
            .unwrap();

        assert_eq!(report.modules, 2);
        assert!(fx.root.join("build/js/modules/lit.js").is_file());
        assert!(
            fx.root
                .join("build/js/modules/@lit-labs/ssr-client/hydrate.js")
                .is_file()
        );
    }

    #[tokio::test]
    async fn test_build_missing_module_fails() {
        let fx = Fixture::new();
        blog_app(&fx);
        let config = fx.config("[bundler]\nmodules = [\"absent\"]");
        let hierarchy = RouteHierarchy::from_config(&config);

        let err = build_production(&config, &hierarchy, &InlineCompiler::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::ModuleNotFound(ref s) if s == "absent"));
    }

    #[tokio::test]
    async fn test_build_compile_error_surfaces_diagnostic() {
        let fx = Fixture::new();
        fx.write("pages/page.js", "export default () => 'SYNTAX ERROR';");
        let config = fx.config("");
        let hierarchy = RouteHierarchy::from_config(&config);

        let err = build_production(&config, &hierarchy, &InlineCompiler::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Compile(CompileError::Failed { .. })));
        assert!(err.to_string().contains("Unexpected token"));
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_output() {
        let fx = Fixture::new();
        blog_app(&fx);
        let config = fx.config("");
        let hierarchy = RouteHierarchy::from_config(&config);
        hierarchy.scan().await.unwrap();

        let outputs = [OutputFile {
            path: fx.root.join("build/js/pages/ffffffffffffffff.js"),
            entry: Some(fx.root.join("pages/page.js")),
        }];
        assert!(matches!(
            verify_outputs(&hierarchy, &outputs),
            Err(CompileError::UnmappedOutput { .. })
        ));

        let outputs = [OutputFile {
            path: fx.root.join("build/js/pages/x.js"),
            entry: Some(fx.root.join("pages/elsewhere/page.js")),
        }];
        assert!(verify_outputs(&hierarchy, &outputs).is_err());
    }
}
