//! Kvikk - file-system routing and asset resolution for component web apps.
//!
//! The library exposes the contract a server or CLI consumes:
//!
//! - [`route::RouteHierarchy`]: scan convention files, look routes up by
//!   hash or source, resolve the `document` / `not-found` / `error` overrides
//! - [`bundler::Gateway`]: resolve a page, component, layout or module to
//!   compiled text (development) or a pre-built file (production)
//! - [`bundler::build_production`]: the ahead-of-time pass

pub mod bundler;
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod logger;
pub mod route;
pub mod system;
pub mod utils;
pub mod watch;
