//! `kvikk resolve`: resolve one asset through the gateway.

use std::io::Write;

use anyhow::{Result, anyhow};

use super::common::{esbuild_gateway, materialize_defaults, scanned_hierarchy};
use crate::bundler::{AssetKind, ModuleBody};
use crate::config::AppConfig;
use crate::core::RuntimeMode;

pub async fn resolve_asset(
    config: &AppConfig,
    kind: AssetKind,
    id: &str,
    mode: RuntimeMode,
) -> Result<()> {
    materialize_defaults(config)?;
    let hierarchy = scanned_hierarchy(config).await?;
    let gateway = esbuild_gateway(config, hierarchy, mode);

    let body = gateway
        .resolve(kind, id)
        .await
        .map_err(|e| anyhow!("{} ({})", e, e.status_code()))?;

    match body {
        ModuleBody::Compiled(text) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
        ModuleBody::Static(path) => println!("{}", path.display()),
    }
    Ok(())
}
