//! `kvikk watch`: development re-scan loop.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::common::{esbuild_gateway, materialize_defaults};
use crate::bundler::AssetUrls;
use crate::config::AppConfig;
use crate::core::RuntimeMode;
use crate::logger::{status_error, status_success};
use crate::route::RouteHierarchy;
use crate::utils::plural::plural_count;
use crate::watch::PagesWatcher;

pub async fn watch(config: &AppConfig) -> Result<()> {
    materialize_defaults(config)?;

    // Watch first so edits made during the initial scan are not lost.
    let watcher = PagesWatcher::new(config).context("failed to start file watcher")?;
    for root in watcher.roots() {
        crate::debug!("watch"; "root {}", config.root_relative(root).display());
    }

    let hierarchy = Arc::new(RouteHierarchy::from_config(config));
    match hierarchy.scan().await {
        Ok(table) => status_success(&format!("scanned: {}", plural_count(table.len(), "route"))),
        // Keep watching so the next edit can fix the tree.
        Err(e) => status_error("initial scan failed", &e.to_string()),
    }

    let gateway = Arc::new(esbuild_gateway(config, hierarchy, RuntimeMode::Development));
    crate::log!("watch"; "assets under {}", AssetUrls::from_config(config).prefix());

    watcher.run(gateway).await;
    Ok(())
}
