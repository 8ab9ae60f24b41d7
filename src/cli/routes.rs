//! `kvikk routes`: print the route table.

use std::path::PathBuf;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::common::scanned_hierarchy;
use crate::bundler::AssetUrls;
use crate::config::AppConfig;
use crate::route::{ContentHash, HttpMethod, Middleware, RouteEntry, RouteKind};
use crate::system::SystemFile;
use crate::utils::plural::plural_count;

#[derive(Debug, Serialize)]
struct RouteView<'a> {
    hash: ContentHash,
    pattern: &'a str,
    kind: RouteKind,
    methods: &'a [HttpMethod],
    #[serde(skip_serializing_if = "Option::is_none")]
    middleware: Option<&'a Middleware>,
    source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle: Option<String>,
}

impl<'a> RouteView<'a> {
    fn new(entry: &'a RouteEntry, config: &AppConfig, urls: &AssetUrls) -> Self {
        Self {
            hash: entry.hash,
            pattern: &entry.pattern,
            kind: entry.kind,
            methods: &entry.capabilities.methods,
            middleware: entry.capabilities.middleware.as_ref(),
            source: config.root_relative(&entry.source),
            bundle: entry.bundle.then(|| urls.page(&entry.hash)),
        }
    }
}

pub async fn list_routes(config: &AppConfig, json: bool) -> Result<()> {
    let hierarchy = scanned_hierarchy(config).await?;
    let table = hierarchy.snapshot();
    let entries = table.entries();
    let urls = AssetUrls::from_config(config);
    let views: Vec<_> = entries
        .iter()
        .map(|e| RouteView::new(e, config, &urls))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    let width = views.iter().map(|v| v.pattern.len()).max().unwrap_or(0);
    for view in &views {
        let methods: Vec<_> = view.methods.iter().map(|m| m.as_str()).collect();
        println!(
            "{}  {:<width$}  {:<6}  {:<9}  {}",
            view.hash.dimmed(),
            view.pattern,
            view.kind.to_string(),
            methods.join(","),
            view.source.display().dimmed(),
        );
    }

    for file in SystemFile::ALL {
        let source = hierarchy.resolve_system(file).await?;
        println!(
            "{:<16}  {}",
            file.name().dimmed(),
            config.root_relative(&source).display()
        );
    }

    crate::log!(
        "routes"; "{} ({}, {}, {})",
        plural_count(table.len(), "route"),
        plural_count(table.count(RouteKind::Page), "page"),
        plural_count(table.count(RouteKind::DataRoute), "data route"),
        plural_count(table.count(RouteKind::Action), "action"),
    );
    Ok(())
}
