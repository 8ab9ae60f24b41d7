//! Runtime mode of the asset gateway.

use std::fmt;

/// How compiled assets are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    /// Compile on request, cache components and modules in memory.
    #[default]
    Development,
    /// Serve the output of an earlier production pass, never compile.
    Production,
}

impl RuntimeMode {
    pub const fn from_production(production: bool) -> Self {
        if production {
            Self::Production
        } else {
            Self::Development
        }
    }

    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
        })
    }
}
