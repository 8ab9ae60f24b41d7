//! Translation of convention directories into URL route patterns.
//!
//! | Directory               | Pattern         |
//! |-------------------------|-----------------|
//! | `blog/[slug]`           | `/blog/:slug`   |
//! | `files/[...path]`       | `/files/*`      |
//! | `docs/[[...page]]`      | `/docs/:page?`  |
//! | `shop/[a]-[b]`          | `/shop/:a-:b`   |
//!
//! Catch-all forms are only recognized in the final component. A mid-path
//! `[...name]` is left as written.

use std::borrow::Cow;
use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::path::join_url;

/// `[name]` with a non-empty word name.
static DYNAMIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z0-9_]+)\]").unwrap());

/// Split a pattern into everything up to the last `/` and the final component.
fn split_last(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}

/// Rewrite every `[name]` to `:name`.
pub fn dynamic_segments(path: &str) -> Cow<'_, str> {
    DYNAMIC_SEGMENT.replace_all(path, ":$1")
}

/// Rewrite a trailing `[...name]` component to `*`.
pub fn catch_all_segment(path: &str) -> Cow<'_, str> {
    let (head, last) = split_last(path);
    let is_catch_all = last
        .strip_prefix("[...")
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|name| !name.is_empty() && !name.contains(['[', ']']));

    if is_catch_all {
        Cow::Owned(format!("{head}*"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Rewrite a trailing `[[...name]]` component to `:name?`.
pub fn optional_catch_all_segment(path: &str) -> Cow<'_, str> {
    let (head, last) = split_last(path);
    let name = last
        .strip_prefix("[[...")
        .and_then(|rest| rest.strip_suffix("]]"))
        .filter(|name| !name.is_empty() && !name.contains(['[', ']']));

    match name {
        Some(name) => Cow::Owned(format!("{head}:{name}?")),
        None => Cow::Borrowed(path),
    }
}

/// Apply optional catch-all, catch-all and dynamic rewriting, in that order.
///
/// The two catch-all passes inspect the final component and must see it
/// before generic bracket rewriting runs.
pub fn compile_route(path: &str) -> String {
    let path = optional_catch_all_segment(path);
    let path = catch_all_segment(&path);
    dynamic_segments(&path).into_owned()
}

/// Route pattern for a directory relative to the pages root, mounted at `base`.
///
/// The pages root itself maps to `/`.
pub fn route_for_dir(relative_dir: &Path, base: &str) -> String {
    let segments: Vec<_> = relative_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();

    let fs_route = format!("/{}", segments.join("/"));
    join_url(&[base, &compile_route(&fs_route)])
}
