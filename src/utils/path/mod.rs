//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `is_contained`)
//! - [`url`]: URL path joining (`join_url`)

pub mod fs;
pub mod url;

pub use fs::{is_contained, normalize_path};
pub use url::join_url;
