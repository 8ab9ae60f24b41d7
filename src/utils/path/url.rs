//! URL path joining.

/// Join URL path fragments with single slashes.
///
/// Empty fragments are skipped. The result always starts with `/` and never
/// ends with one, except for the root itself.
///
/// # Examples
/// ```ignore
/// join_url(&["/", "blog"])        -> "/blog"
/// join_url(&["/app/", "/blog/"])  -> "/app/blog"
/// join_url(&["/", "/"])           -> "/"
/// ```
pub fn join_url(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        for segment in part.split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
