//! Command-line interface module.

mod args;
pub mod build;
pub mod common;
pub mod resolve;
pub mod routes;
pub mod watch;

pub use args::{Cli, Commands};
