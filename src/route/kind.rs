//! Convention file kinds.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Source extensions accepted for convention files.
pub const SOURCE_EXTENSIONS: [&str; 2] = ["js", "ts"];

/// What a convention file implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// `page.{js,ts}`: server-rendered page with a client bundle.
    Page,
    /// `route.{js,ts}`: data route answering the exported HTTP methods.
    #[serde(rename = "route")]
    DataRoute,
    /// `action.{js,ts}`: form action.
    Action,
}

impl RouteKind {
    pub const ALL: [Self; 3] = [Self::Page, Self::DataRoute, Self::Action];

    /// File stem of the convention file.
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::DataRoute => "route",
            Self::Action => "action",
        }
    }

    /// Discriminator used in hash keys and manifests.
    pub const fn discriminator(self) -> &'static str {
        self.file_stem()
    }

    /// Only pages produce a client bundle.
    pub const fn is_bundle_eligible(self) -> bool {
        matches!(self, Self::Page)
    }

    /// Kind of a convention file, matched on its exact file name.
    ///
    /// `page.js` and `route.ts` match; `page.test.js`, `mypage.js` and
    /// `page.jsx` do not.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        if !SOURCE_EXTENSIONS.contains(&ext) {
            return None;
        }
        Self::ALL.into_iter().find(|kind| kind.file_stem() == stem)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}
