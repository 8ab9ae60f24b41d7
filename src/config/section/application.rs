//! `[application]` section configuration.
//!
//! ```toml
//! [application]
//! name = "My App"
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Display name, used in the default document title.
    pub name: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Kvikk".to_string(),
        }
    }
}
