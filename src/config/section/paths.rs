//! `[paths]` section configuration.
//!
//! URL prefixes used to address assets:
//!
//! ```toml
//! [paths]
//! base = "/"          # Mount point of the application
//! assets = "/_"       # Prefix of every compiled asset
//! js = "/js"          # Script subtree below the asset prefix
//! ```
//!
//! With the defaults a page bundle is served at `/_/js/pages/<hash>.js`.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub base: String,
    pub assets: String,
    pub js: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base: "/".to_string(),
            assets: "/_".to_string(),
            js: "/js".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let fields = [
            (FieldPath::new("paths.base"), &self.base),
            (FieldPath::new("paths.assets"), &self.assets),
            (FieldPath::new("paths.js"), &self.js),
        ];
        for (field, value) in fields {
            if !value.starts_with('/') {
                diag.error_with_hint(
                    field,
                    format!("must start with `/`, got `{value}`"),
                    format!("use `/{}`", value.trim_start_matches('/')),
                );
            }
        }
    }
}
