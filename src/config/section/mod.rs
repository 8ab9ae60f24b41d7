//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kvikk.toml`:
//!
//! | Module        | TOML Section      | Purpose                              |
//! |---------------|-------------------|--------------------------------------|
//! | `application` | `[application]`   | Application metadata                 |
//! | `directories` | `[directories]`   | Source, build and convention dirs    |
//! | `paths`       | `[paths]`         | URL prefixes for served assets       |
//! | `bundler`     | `[bundler]`       | External compiler invocation         |
//! | `logging`     | `[logging]`       | Terminal output                      |

mod application;
mod bundler;
mod directories;
mod logging;
mod paths;

pub use application::ApplicationConfig;
pub use bundler::BundlerConfig;
pub use directories::DirectoriesConfig;
pub use logging::LoggingConfig;
pub use paths::PathsConfig;
