//! File-system routing.
//!
//! Convention files under the pages root become route entries:
//!
//! ```text
//! pages/page.js               → /             [page]
//! pages/blog/[slug]/page.ts   → /blog/:slug   [page]
//! pages/api/[id]/route.js     → /api/:id      [route]
//! pages/login/action.js       → /login        [action]
//! ```
//!
//! - [`pattern`]: directory → URL pattern translation
//! - [`hash`]: content identifiers of `(pattern, kind)`
//! - [`capability`]: exported methods and middleware, read at scan time
//! - [`scan`]: convention file discovery
//! - [`conflict`]: duplicate and collision detection
//! - [`hierarchy`]: the registry, swapped atomically on re-scan

pub mod capability;
pub mod conflict;
mod entry;
mod error;
pub mod hash;
pub mod hierarchy;
pub mod kind;
pub mod pattern;
pub mod scan;

pub use capability::{Capabilities, HttpMethod, Middleware};
pub use conflict::{ConflictKind, RouteConflict};
pub use entry::RouteEntry;
pub use error::HierarchyError;
pub use hash::ContentHash;
pub use hierarchy::{HierarchyOptions, RouteHierarchy, RouteTable};
pub use kind::{RouteKind, SOURCE_EXTENSIONS};
pub use pattern::compile_route;
