//! Setup shared by the CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::bundler::{EsbuildCompiler, Gateway, GatewayOptions};
use crate::config::AppConfig;
use crate::core::RuntimeMode;
use crate::debug;
use crate::embed::{SystemVars, write_system_defaults};
use crate::route::RouteHierarchy;

/// Write the packaged system files so fallbacks point at real files.
pub fn materialize_defaults(config: &AppConfig) -> Result<()> {
    let dir = config.directories.defaults_dir();
    let written = write_system_defaults(&dir, &SystemVars::new(&config.application.name))
        .with_context(|| format!("failed to write system defaults to {}", dir.display()))?;
    for path in written {
        debug!("system"; "wrote {}", config.root_relative(&path).display());
    }
    Ok(())
}

/// Hierarchy after its first scan.
pub async fn scanned_hierarchy(config: &AppConfig) -> Result<Arc<RouteHierarchy>> {
    let hierarchy = Arc::new(RouteHierarchy::from_config(config));
    hierarchy.scan().await.context("route scan failed")?;
    Ok(hierarchy)
}

/// Gateway backed by esbuild.
pub fn esbuild_gateway(
    config: &AppConfig,
    hierarchy: Arc<RouteHierarchy>,
    mode: RuntimeMode,
) -> Gateway<EsbuildCompiler> {
    let compiler = EsbuildCompiler::from_config(config);
    if mode.is_dev()
        && let Err(e) = compiler.ensure_available()
    {
        crate::log!("warning"; "{}, compiles will fail until it is installed", e);
    }
    Gateway::new(
        hierarchy,
        Arc::new(compiler),
        GatewayOptions::from_config(config, mode),
    )
}
