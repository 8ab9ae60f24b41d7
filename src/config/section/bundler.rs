//! `[bundler]` section configuration.
//!
//! ```toml
//! [bundler]
//! command = ["esbuild"]       # or ["npx", "esbuild"]
//! timeout = 30                # seconds per compile
//! minify = true
//! target = "esnext"
//! splitting = false           # share chunks between page bundles
//! sourcemap = true            # emit linked source maps in production
//! modules = ["lit"]           # pre-bundled for production
//! seed = ""                   # extra input to every route hash
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Compiler executable and leading arguments.
    pub command: Vec<String>,
    /// Bound for a single compile, in seconds.
    pub timeout: u64,
    pub minify: bool,
    pub target: String,
    pub splitting: bool,
    pub sourcemap: bool,
    /// Third-party module specifiers bundled ahead of time.
    pub modules: Vec<String>,
    /// Appended to every route hash input when non-empty.
    pub seed: String,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: vec!["esbuild".to_string()],
            timeout: 30,
            minify: true,
            target: "esnext".to_string(),
            splitting: false,
            sourcemap: true,
            modules: Vec::new(),
            seed: String::new(),
        }
    }
}

impl BundlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Seed as an option, `None` when empty.
    pub fn seed(&self) -> Option<&str> {
        Some(self.seed.as_str()).filter(|s| !s.is_empty())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.first().is_none_or(|c| c.trim().is_empty()) {
            diag.error_with_hint(
                FieldPath::new("bundler.command"),
                "must name an executable",
                "command = [\"esbuild\"]",
            );
        }
        if self.timeout == 0 {
            diag.error(
                FieldPath::new("bundler.timeout"),
                "must be greater than zero",
            );
        }
        for module in &self.modules {
            if module.starts_with('.') || module.starts_with('/') {
                diag.error(
                    FieldPath::new("bundler.modules"),
                    format!("`{module}` is not a package specifier"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_bundler_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.bundler.command, vec!["esbuild"]);
        assert_eq!(config.bundler.timeout(), Duration::from_secs(30));
        assert!(config.bundler.minify);
        assert_eq!(config.bundler.seed(), None);
    }

    #[test]
    fn test_bundler_custom() {
        let config = test_parse_config(
            "[bundler]\ncommand = [\"npx\", \"esbuild\"]\ntimeout = 5\nmodules = [\"lit\"]\nseed = \"v2\"",
        );
        assert_eq!(config.bundler.command, vec!["npx", "esbuild"]);
        assert_eq!(config.bundler.timeout, 5);
        assert_eq!(config.bundler.modules, vec!["lit"]);
        assert_eq!(config.bundler.seed(), Some("v2"));
    }

    #[test]
    fn test_bundler_validate() {
        let config =
            test_parse_config("[bundler]\ncommand = []\ntimeout = 0\nmodules = [\"./local\"]");
        let mut diag = ConfigDiagnostics::new();
        config.bundler.validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }
}
