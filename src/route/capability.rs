//! Capability descriptors computed once per convention file at scan time.
//!
//! The exports of a convention file are read from its syntax tree (oxc),
//! never by executing it. The HTTP layer registers handlers from the
//! resulting descriptor instead of inspecting module objects per request.

use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::{Declaration, Statement};
use oxc::parser::Parser;
use oxc::span::SourceType;
use serde::Serialize;

use super::RouteKind;
use super::kind::SOURCE_EXTENSIONS;
use crate::utils::path::normalize_path;

/// Name of the inline and sibling middleware hook.
pub const MIDDLEWARE: &str = "middleware";

/// HTTP methods a convention file can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
}

impl HttpMethod {
    pub const ALL: [Self; 3] = [Self::Get, Self::Put, Self::Post];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

/// Where a route's middleware hook comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "from", content = "source", rename_all = "lowercase")]
pub enum Middleware {
    /// `export const middleware = ...` in the convention file itself.
    Inline,
    /// A `middleware.{js,ts}` file next to the convention file.
    Sibling(PathBuf),
}

/// Exports found in a module's top level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSet {
    pub named: Vec<String>,
    pub has_default: bool,
    /// `export * from` specifiers that do not name a local file.
    pub opaque: Vec<String>,
}

impl ExportSet {
    pub fn contains(&self, name: &str) -> bool {
        self.named.iter().any(|n| n == name)
    }
}

/// What a route entry implements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub methods: Vec<HttpMethod>,
    pub middleware: Option<Middleware>,
    pub has_default: bool,
    pub exports: Vec<String>,
}

impl Capabilities {
    /// Derive capabilities from a file's exports.
    ///
    /// Pages answer GET and actions POST. Data routes answer exactly the
    /// methods they export.
    pub fn from_exports(kind: RouteKind, exports: ExportSet, sibling: Option<PathBuf>) -> Self {
        let methods = match kind {
            RouteKind::Page => vec![HttpMethod::Get],
            RouteKind::Action => vec![HttpMethod::Post],
            RouteKind::DataRoute => HttpMethod::ALL
                .into_iter()
                .filter(|m| exports.contains(m.as_str()))
                .collect(),
        };

        let middleware = if exports.contains(MIDDLEWARE) {
            Some(Middleware::Inline)
        } else {
            sibling.map(Middleware::Sibling)
        };

        Self {
            methods,
            middleware,
            has_default: exports.has_default,
            exports: exports.named,
        }
    }

    pub fn supports(&self, method: HttpMethod) -> bool {
        self.methods.contains(&method)
    }
}

/// Parse failure of a convention file.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to parse `{}`:\n{}", .path.display(), .diagnostics.join("\n"))]
pub struct AnalyzeError {
    pub path: PathBuf,
    pub diagnostics: Vec<String>,
}

/// Collect the top-level exports of a JavaScript or TypeScript module.
///
/// `export * from './file'` is followed into local files, so handlers
/// re-exported from a sibling module count as exports of `path`.
pub fn analyze_exports(path: &Path, source: &str) -> Result<ExportSet, AnalyzeError> {
    let mut exports = ExportSet::default();
    let mut visited = vec![normalize_path(path)];
    collect_module(path, source, true, &mut exports, &mut visited)?;
    Ok(exports)
}

fn collect_module(
    path: &Path,
    source: &str,
    is_entry: bool,
    exports: &mut ExportSet,
    visited: &mut Vec<PathBuf>,
) -> Result<(), AnalyzeError> {
    let source_type = match path.extension().and_then(|e| e.to_str()) {
        Some("ts") => SourceType::ts(),
        _ => SourceType::mjs(),
    };

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(AnalyzeError {
            path: path.to_path_buf(),
            diagnostics: ret.errors.iter().map(ToString::to_string).collect(),
        });
    }

    for stmt in &ret.program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(declaration) = &decl.declaration {
                    collect_declaration(declaration, &mut exports.named);
                }
                for spec in &decl.specifiers {
                    let name = spec.exported.name();
                    if name.as_str() == "default" {
                        exports.has_default |= is_entry;
                    } else {
                        exports.named.push(name.to_string());
                    }
                }
            }
            Statement::ExportDefaultDeclaration(_) => exports.has_default |= is_entry,
            Statement::ExportAllDeclaration(decl) => {
                let specifier = decl.source.value.as_str();
                if let Some(name) = &decl.exported {
                    exports.named.push(name.name().to_string());
                    continue;
                }
                match reexport_target(path, specifier) {
                    Some(target) if visited.contains(&target) => {}
                    Some(target) => {
                        let text = std::fs::read_to_string(&target).map_err(|err| AnalyzeError {
                            path: path.to_path_buf(),
                            diagnostics: vec![format!("cannot read `{specifier}`: {err}")],
                        })?;
                        visited.push(target.clone());
                        collect_module(&target, &text, false, exports, visited)?;
                    }
                    None => exports.opaque.push(specifier.to_string()),
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn collect_declaration(declaration: &Declaration<'_>, names: &mut Vec<String>) {
    match declaration {
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                names.extend(
                    declarator
                        .id
                        .get_binding_identifiers()
                        .iter()
                        .map(|id| id.name.to_string()),
                );
            }
        }
        _ => {}
    }
}

/// Local file behind a relative `export * from` specifier.
fn reexport_target(from: &Path, specifier: &str) -> Option<PathBuf> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }
    let base = from.parent()?.join(specifier);

    let with_ext = SOURCE_EXTENSIONS.iter().map(|ext| {
        let mut file = base.clone().into_os_string();
        file.push(format!(".{ext}"));
        PathBuf::from(file)
    });
    let index = SOURCE_EXTENSIONS
        .iter()
        .map(|ext| base.join(format!("index.{ext}")));

    std::iter::once(base.clone())
        .chain(with_ext)
        .chain(index)
        .find(|candidate| candidate.is_file())
        .map(|found| normalize_path(&found))
}

/// Sibling `middleware.{js,ts}` next to a convention file, `.js` first.
pub fn find_sibling_middleware(convention_file: &Path) -> Option<PathBuf> {
    let dir = convention_file.parent()?;
    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{MIDDLEWARE}.{ext}")))
        .find(|candidate| candidate.is_file())
}
