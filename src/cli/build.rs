//! `kvikk build`: the production pass.

use anyhow::{Context, Result};

use crate::bundler::{EsbuildCompiler, build_production};
use crate::config::AppConfig;
use crate::route::RouteHierarchy;

pub async fn build(config: &AppConfig) -> Result<()> {
    let compiler = EsbuildCompiler::from_config(config);
    compiler
        .ensure_available()
        .context("a module compiler is required for production builds")?;

    let hierarchy = RouteHierarchy::from_config(config);
    build_production(config, &hierarchy, &compiler)
        .await
        .context("production build failed")?;
    Ok(())
}
