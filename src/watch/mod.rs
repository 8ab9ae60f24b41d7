//! Development watcher.
//!
//! Any change under the source directories triggers a full re-scan of the
//! route hierarchy and invalidates the changed paths in the gateway. A
//! failed re-scan is reported and the previous route table stays live.
//!
//! ```text
//! notify → Debouncer (timing, dedup) → invalidate + scan → status block
//! ```

mod debouncer;
mod roots;
mod types;


pub use types::ChangeKind;

use std::path::PathBuf;
use std::sync::Arc;

use notify::RecommendedWatcher;
use rustc_hash::FxHashMap;

use crate::bundler::{Gateway, ModuleCompiler};
use crate::config::AppConfig;
use crate::core::{begin_update, end_update, register_watcher};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::route::{HierarchyError, RouteTable};
use crate::utils::plural::plural_count;
use debouncer::Debouncer;
use roots::WatchRoots;

/// Outcome of one re-scan.
#[derive(Debug)]
pub struct Rescan {
    pub table: Arc<RouteTable>,
    /// The set of route identifiers differs from the previous table.
    pub routes_changed: bool,
    pub invalidated: usize,
}

pub struct PagesWatcher {
    /// Channel to receive notify events (sync side)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    debouncer: Debouncer,
}

impl PagesWatcher {
    /// Start watching right away. Events buffer until `run`.
    pub fn new(config: &AppConfig) -> notify::Result<Self> {
        let dirs = &config.directories;
        let paths = vec![
            dirs.pages.clone(),
            dirs.components.clone(),
            dirs.layouts.clone(),
            dirs.system.clone(),
        ];

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut roots = WatchRoots::new(paths);
        roots.maintain(&mut watcher);

        Ok(Self {
            notify_rx,
            watcher,
            roots,
            debouncer: Debouncer::new(),
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        self.roots.desired()
    }

    /// Run until Ctrl+C.
    pub async fn run<C: ModuleCompiler>(self, gateway: Arc<Gateway<C>>) {
        let Self {
            notify_rx,
            mut watcher,
            mut roots,
            mut debouncer,
        } = self;

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded::<()>(1);
        register_watcher(shutdown_tx);
        let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();
        std::thread::spawn(move || {
            if shutdown_rx.recv().is_ok() {
                let _ = stop_tx.send(());
            }
        });

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    roots.maintain(&mut watcher);
                    if let Some(changes) = debouncer.take_if_ready() {
                        report(apply_changes(&gateway, &changes).await, changes.len());
                    }
                }
            }
        }
    }
}

/// Invalidate every changed path, then re-scan.
pub async fn apply_changes<C: ModuleCompiler>(
    gateway: &Gateway<C>,
    changes: &FxHashMap<PathBuf, ChangeKind>,
) -> Result<Rescan, HierarchyError> {
    let hierarchy = gateway.hierarchy();
    let previous = hierarchy.snapshot();

    begin_update();
    for path in changes.keys() {
        gateway.invalidate(path);
    }
    let result = hierarchy.scan().await;
    end_update();

    let table = result?;
    let mut before: Vec<_> = previous.entries().iter().map(|e| e.hash).collect();
    let mut after: Vec<_> = table.entries().iter().map(|e| e.hash).collect();
    before.sort();
    after.sort();

    Ok(Rescan {
        routes_changed: before != after,
        invalidated: changes.len(),
        table,
    })
}

fn report(result: Result<Rescan, HierarchyError>, changes: usize) {
    match result {
        Ok(rescan) if rescan.routes_changed => status_success(&format!(
            "rescanned: {}",
            plural_count(rescan.table.len(), "route")
        )),
        Ok(rescan) => status_unchanged(&format!(
            "routes unchanged, {} invalidated",
            plural_count(rescan.invalidated, "file")
        )),
        Err(e) => status_error(
            &format!("rescan after {} failed", plural_count(changes, "change")),
            &e.to_string(),
        ),
    }
}
