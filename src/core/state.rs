//! Process state for the watch loop.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `BUSY`: Is a re-scan in progress?

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// A re-scan is running
static BUSY: AtomicBool = AtomicBool::new(false);

/// Wakes the watch loop on shutdown
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

// =============================================================================
// BUSY state
// =============================================================================

fn is_busy() -> bool {
    BUSY.load(Ordering::Acquire)
}

pub fn begin_update() {
    BUSY.store(true, Ordering::Release);
}

pub fn end_update() {
    BUSY.store(false, Ordering::Release);
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Before `register_watcher()` the process exits right away. After it, the
/// watch loop is woken up and finishes its current re-scan first.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            if is_busy() {
                crate::log!("watch"; "shutting down after the current re-scan...");
            } else {
                crate::log!("watch"; "shutting down...");
            }
            let _ = tx.send(());
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the watch loop for graceful shutdown.
pub fn register_watcher(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
