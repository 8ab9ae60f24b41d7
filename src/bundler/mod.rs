//! Module resolution and bundling.
//!
//! - [`asset`]: asset kinds, requests and their URLs
//! - [`compiler`]: the `ModuleCompiler` seam and its errors
//! - [`esbuild`]: the esbuild compiler
//! - [`resolve`]: `node_modules` lookup for bare specifiers
//! - [`cache`]: coalescing caches for compiled bodies
//! - [`gateway`]: request → module text (development) or file (production)
//! - [`build`]: the ahead-of-time production pass

pub mod asset;
pub mod build;
pub mod cache;
pub mod compiler;
pub mod esbuild;
pub mod gateway;
pub mod resolve;

pub use asset::{AssetKind, AssetRequest, AssetUrls};
pub use build::{BuildError, BuildReport, build_production};
pub use compiler::{BundleRequest, CompileError, ModuleCompiler, NamedEntry, OutputFile};
pub use esbuild::EsbuildCompiler;
pub use gateway::{Gateway, GatewayOptions, ModuleBody, ResolveError};
pub use resolve::resolve_module;
