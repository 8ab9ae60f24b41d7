//! The module resolver.
//!
//! Turns an asset request into browser-ready module text. In development
//! every request resolves an entry point and compiles it, serving components
//! and third-party modules from memory after the first compile. In
//! production nothing is compiled: requests map to files written by the
//! production pass.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::asset::AssetKind;
use super::cache::ModuleCache;
use super::compiler::{BundleRequest, CompileError, ModuleCompiler};
use super::resolve::{Specifier, resolve_module};
use crate::config::AppConfig;
use crate::core::RuntimeMode;
use crate::debug;
use crate::route::{RouteEntry, RouteHierarchy, SOURCE_EXTENSIONS};
use crate::utils::mime;
use crate::utils::path::is_contained;

// ============================================================================
// Results
// ============================================================================

/// A resolved module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBody {
    /// Compiled text, development mode.
    Compiled(Arc<str>),
    /// Pre-built file, production mode. Served by a static file handler.
    Static(PathBuf),
}

impl ModuleBody {
    pub const fn content_type(&self) -> &'static str {
        mime::JAVASCRIPT
    }

    pub fn as_compiled(&self) -> Option<&str> {
        match self {
            Self::Compiled(body) => Some(body),
            Self::Static(_) => None,
        }
    }

    pub fn as_static(&self) -> Option<&Path> {
        match self {
            Self::Compiled(_) => None,
            Self::Static(path) => Some(path),
        }
    }
}

/// Why a request produced no module.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: AssetKind, id: String },

    #[error("{source}")]
    Compile {
        entry: PathBuf,
        #[source]
        source: CompileError,
    },
}

impl ResolveError {
    fn not_found(kind: AssetKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status the transport layer should answer with.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Compile { .. } => 500,
        }
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Directories the gateway resolves against.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub mode: RuntimeMode,
    /// Where `node_modules` lookup starts.
    pub root: PathBuf,
    pub components_dir: PathBuf,
    pub layouts_dir: PathBuf,
    /// Output of the production pass, `<build><js>`.
    pub output_dir: PathBuf,
}

impl GatewayOptions {
    pub fn from_config(config: &AppConfig, mode: RuntimeMode) -> Self {
        Self {
            mode,
            root: config.root.clone(),
            components_dir: config.directories.components.clone(),
            layouts_dir: config.directories.layouts.clone(),
            output_dir: output_dir(config),
        }
    }
}

/// `<build><js>`, the directory the production pass writes into.
pub fn output_dir(config: &AppConfig) -> PathBuf {
    config
        .directories
        .build
        .join(config.paths.js.trim_start_matches('/'))
}

/// Output file of a pre-bundled module, relative to the modules directory.
pub fn module_file_name(specifier: &str) -> String {
    if specifier.ends_with(".js") {
        specifier.to_string()
    } else {
        format!("{specifier}.js")
    }
}

pub struct Gateway<C> {
    hierarchy: Arc<RouteHierarchy>,
    compiler: Arc<C>,
    options: GatewayOptions,
    components: ModuleCache,
    modules: ModuleCache,
    /// In-flight page and layout compiles. Nothing is kept after completion.
    uncached: ModuleCache,
    generation: AtomicU64,
}

impl<C: ModuleCompiler> Gateway<C> {
    pub fn new(hierarchy: Arc<RouteHierarchy>, compiler: Arc<C>, options: GatewayOptions) -> Self {
        Self {
            hierarchy,
            compiler,
            options,
            components: ModuleCache::new("component"),
            modules: ModuleCache::new("module"),
            uncached: ModuleCache::new("page"),
            generation: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.options.mode
    }

    pub fn hierarchy(&self) -> &RouteHierarchy {
        &self.hierarchy
    }

    /// Bumped by every `invalidate`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Resolve one asset request.
    pub async fn resolve(&self, kind: AssetKind, id: &str) -> Result<ModuleBody, ResolveError> {
        match self.options.mode {
            RuntimeMode::Development => self.compile(kind, id).await.map(ModuleBody::Compiled),
            RuntimeMode::Production => self.prebuilt(kind, id).await.map(ModuleBody::Static),
        }
    }

    /// Forget everything compiled from `source` and bump the generation.
    ///
    /// A changed file that no cached entry was compiled from directly may
    /// still be imported by one, so components are dropped wholesale in that
    /// case. Third-party modules only change inside `node_modules`.
    pub fn invalidate(&self, source: &Path) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if source.components().any(|c| c.as_os_str() == "node_modules") {
            self.modules.invalidate_all();
        } else if self.components.invalidate(source) == 0 {
            self.components.invalidate_all();
        }
        debug!("bundle"; "invalidated {} (generation {})", source.display(), generation);
        generation
    }

    /// Drop every cached body.
    pub fn invalidate_all(&self) -> u64 {
        self.components.invalidate_all();
        self.modules.invalidate_all();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ========================================================================
    // development
    // ========================================================================

    async fn compile(&self, kind: AssetKind, id: &str) -> Result<Arc<str>, ResolveError> {
        let generation = self.generation();
        match kind {
            AssetKind::Page => {
                let entry = self.page_entry(id)?;
                let key = format!("page:{}@{generation}", entry.hash);
                self.coalesced(&key, &entry.source, generation).await
            }
            AssetKind::Layout => {
                let source = named_entry(&self.options.layouts_dir, id)
                    .await
                    .ok_or_else(|| ResolveError::not_found(kind, id))?;
                let key = format!("layout:{id}@{generation}");
                self.coalesced(&key, &source, generation).await
            }
            AssetKind::Component => {
                let source = named_entry(&self.options.components_dir, id)
                    .await
                    .ok_or_else(|| ResolveError::not_found(kind, id))?;
                self.cached(&self.components, id, source, generation).await
            }
            AssetKind::Module => {
                let source = self
                    .module_entry(id)
                    .await
                    .ok_or_else(|| ResolveError::not_found(kind, id))?;
                self.cached(&self.modules, id, source, generation).await
            }
        }
    }

    async fn coalesced(
        &self,
        key: &str,
        source: &Path,
        generation: u64,
    ) -> Result<Arc<str>, ResolveError> {
        let request = BundleRequest {
            entry: source.to_path_buf(),
            generation,
        };
        self.uncached
            .coalesce(key, || self.compiler.bundle(&request))
            .await
            .map_err(|source| ResolveError::Compile {
                entry: request.entry.clone(),
                source,
            })
    }

    async fn cached(
        &self,
        cache: &ModuleCache,
        key: &str,
        source: PathBuf,
        generation: u64,
    ) -> Result<Arc<str>, ResolveError> {
        let request = BundleRequest {
            entry: source,
            generation,
        };
        cache
            .get_or_compile(key, &request.entry, || self.compiler.bundle(&request))
            .await
            .map_err(|source| ResolveError::Compile {
                entry: request.entry.clone(),
                source,
            })
    }

    /// Page entry for a hash. Data routes and actions have no client bundle.
    fn page_entry(&self, id: &str) -> Result<Arc<RouteEntry>, ResolveError> {
        self.hierarchy
            .lookup_by_hash(id)
            .filter(|entry| entry.bundle)
            .ok_or_else(|| ResolveError::not_found(AssetKind::Page, id))
    }

    async fn module_entry(&self, specifier: &str) -> Option<PathBuf> {
        let root = self.options.root.clone();
        let specifier = specifier.to_string();
        tokio::task::spawn_blocking(move || resolve_module(&root, &specifier))
            .await
            .ok()
            .flatten()
    }

    // ========================================================================
    // production
    // ========================================================================

    async fn prebuilt(&self, kind: AssetKind, id: &str) -> Result<PathBuf, ResolveError> {
        let path = match kind {
            AssetKind::Page => {
                let entry = self.page_entry(id)?;
                self.options
                    .output_dir
                    .join(kind.dir())
                    .join(entry.bundle_file_name())
            }
            AssetKind::Module if Specifier::parse(id).is_some() => self
                .options
                .output_dir
                .join(kind.dir())
                .join(module_file_name(id)),
            // Components and layouts are inlined into page bundles.
            _ => return Err(ResolveError::not_found(kind, id)),
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(ResolveError::not_found(kind, id)),
        }
    }
}

/// `<dir>/<name>.{js,ts}`, or `<dir>/<name>/index.{js,ts}`.
async fn named_entry(dir: &Path, name: &str) -> Option<PathBuf> {
    let name = name.strip_suffix(".js").unwrap_or(name);
    if name.is_empty() || !is_contained(Path::new(name)) {
        return None;
    }

    let mut candidates = Vec::with_capacity(SOURCE_EXTENSIONS.len() * 2);
    for ext in SOURCE_EXTENSIONS {
        candidates.push(dir.join(format!("{name}.{ext}")));
    }
    for ext in SOURCE_EXTENSIONS {
        candidates.push(dir.join(name).join(format!("index.{ext}")));
    }

    for candidate in candidates {
        let is_file = tokio::fs::metadata(&candidate)
            .await
            .is_ok_and(|meta| meta.is_file());
        if is_file {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests;
