//! Asset requests and their client-facing URLs.
//!
//! ```text
//! <base>/_/js/pages/<hash>.js
//! <base>/_/js/components/<name>.js
//! <base>/_/js/layouts/<name>.js
//! <base>/_/js/modules/<specifier>
//! ```

use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::config::AppConfig;
use crate::route::ContentHash;
use crate::utils::path::join_url;

/// Characters escaped in module specifiers. `/` and `@` stay readable.
const SPECIFIER: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// What an asset request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Client bundle of a page route, addressed by hash.
    Page,
    /// Shared component, addressed by name under the components dir.
    Component,
    /// Layout, addressed by name under the layouts dir.
    Layout,
    /// Third-party module, addressed by package specifier.
    Module,
}

impl AssetKind {
    pub const ALL: [Self; 4] = [Self::Page, Self::Component, Self::Layout, Self::Module];

    /// URL and output subdirectory.
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Page => "pages",
            Self::Component => "components",
            Self::Layout => "layouts",
            Self::Module => "modules",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Component => "component",
            Self::Layout => "layout",
            Self::Module => "module",
        }
    }

    fn from_dir(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.dir() == dir)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s || k.dir() == s)
            .ok_or_else(|| format!("unknown asset kind `{s}` (page, component, layout, module)"))
    }
}

/// A logical asset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    pub kind: AssetKind,
    /// Hash for pages, name for components and layouts, specifier for modules.
    pub id: String,
}

impl AssetRequest {
    pub fn new(kind: AssetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn page(hash: &ContentHash) -> Self {
        Self::new(AssetKind::Page, hash.to_string())
    }
}

impl fmt::Display for AssetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.id)
    }
}

/// URL builder and parser for compiled assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrls {
    /// `<base><assets><js>`, e.g. `/_/js`
    prefix: String,
}

impl AssetUrls {
    pub fn new(base: &str, assets: &str, js: &str) -> Self {
        Self {
            prefix: join_url(&[base, assets, js]),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.paths.base, &config.paths.assets, &config.paths.js)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn page(&self, hash: &ContentHash) -> String {
        format!("{}/pages/{hash}.js", self.prefix)
    }

    pub fn component(&self, name: &str) -> String {
        format!("{}/components/{name}.js", self.prefix)
    }

    pub fn layout(&self, name: &str) -> String {
        format!("{}/layouts/{name}.js", self.prefix)
    }

    pub fn module(&self, specifier: &str) -> String {
        format!(
            "{}/modules/{}",
            self.prefix,
            utf8_percent_encode(specifier, SPECIFIER)
        )
    }

    pub fn url_for(&self, request: &AssetRequest) -> String {
        match request.kind {
            AssetKind::Page | AssetKind::Component | AssetKind::Layout => {
                format!("{}/{}/{}.js", self.prefix, request.kind.dir(), request.id)
            }
            AssetKind::Module => self.module(&request.id),
        }
    }

    /// Parse an incoming URL path into a request.
    ///
    /// Query strings and fragments are ignored. Returns `None` for paths
    /// outside the asset prefix or with an unknown kind directory.
    pub fn parse(&self, url_path: &str) -> Option<AssetRequest> {
        let path = url_path.split(['?', '#']).next().unwrap_or_default();
        let rest = path.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let (dir, id) = rest.split_once('/')?;
        let kind = AssetKind::from_dir(dir)?;

        let id = match kind {
            AssetKind::Module => percent_decode_str(id).decode_utf8().ok()?.into_owned(),
            _ => id.strip_suffix(".js")?.to_string(),
        };
        (!id.is_empty()).then(|| AssetRequest::new(kind, id))
    }
}
