//! Core types shared across the codebase.

mod mode;
mod state;

pub use mode::RuntimeMode;
pub use state::{begin_update, end_update, is_shutdown, register_watcher, setup_shutdown_handler};
