//! Route hierarchy errors.

use std::path::PathBuf;

use thiserror::Error;

use super::capability::AnalyzeError;
use super::conflict::{RouteConflict, format_conflicts};
use crate::system::OverrideError;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("failed to walk `{}`: {message}", .path.display())]
    Walk { path: PathBuf, message: String },

    #[error("failed to read `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not under the pages root `{}`", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    /// Two convention files claim the same identifier.
    #[error("route configuration error:\n{}", format_conflicts(.0))]
    Conflict(Vec<RouteConflict>),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error("scan task failed: {0}")]
    Join(String),
}

impl HierarchyError {
    /// Configuration errors are fatal at startup and during builds.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::Override(OverrideError::Ambiguous { .. })
        )
    }
}
