//! esbuild as the module compiler.
//!
//! Development compiles write the bundle to stdout. Production passes use
//! esbuild's `name=path` entry syntax with `--entry-names=[name]` so every
//! output file is named by its route hash, and ask for a metafile to map
//! outputs back to entry points.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::compiler::{BundleRequest, CompileError, ModuleCompiler, NamedEntry, OutputFile};
use crate::config::AppConfig;
use crate::debug;
use crate::utils::exec::Cmd;
use crate::utils::path::normalize_path;

const METAFILE: &str = ".kvikk-meta.json";

#[derive(Debug, Clone)]
pub struct EsbuildCompiler {
    command: Vec<String>,
    /// Working directory, where `node_modules` lookup starts.
    root: PathBuf,
    minify: bool,
    target: String,
    splitting: bool,
    sourcemap: bool,
    timeout: Duration,
}

impl EsbuildCompiler {
    pub fn from_config(config: &AppConfig) -> Self {
        let bundler = &config.bundler;
        Self {
            command: bundler.command.clone(),
            root: config.root.clone(),
            minify: bundler.minify,
            target: bundler.target.clone(),
            splitting: bundler.splitting,
            sourcemap: bundler.sourcemap,
            timeout: bundler.timeout(),
        }
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("esbuild")
    }

    /// Check that the configured executable is on `PATH`.
    pub fn ensure_available(&self) -> Result<PathBuf, CompileError> {
        which::which(self.program()).map_err(|e| CompileError::Spawn {
            program: self.program().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        })
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--bundle".to_string(),
            "--format=esm".to_string(),
            format!("--target={}", self.target),
            "--charset=utf8".to_string(),
            "--legal-comments=none".to_string(),
            "--resolve-extensions=.ts,.js".to_string(),
            "--log-level=error".to_string(),
            "--color=false".to_string(),
        ];
        if self.minify {
            args.push("--minify".to_string());
        }
        args
    }

    fn dev_args(&self, entry: &Path) -> Vec<String> {
        let mut args = vec![entry.to_string_lossy().into_owned()];
        args.extend(self.common_args());
        args
    }

    fn prod_args(&self, entries: &[NamedEntry], outdir: &Path, metafile: &Path) -> Vec<String> {
        let mut args: Vec<String> = entries
            .iter()
            .map(|e| format!("{}={}", e.name, e.source.display()))
            .collect();
        args.extend(self.common_args());
        args.push(format!("--outdir={}", outdir.display()));
        args.push("--entry-names=[name]".to_string());
        args.push("--chunk-names=chunks/[name]-[hash]".to_string());
        args.push(format!("--metafile={}", metafile.display()));
        if self.splitting {
            args.push("--splitting".to_string());
        }
        if self.sourcemap {
            args.push("--sourcemap".to_string());
        }
        args
    }

    fn cmd(&self, args: Vec<String>) -> Cmd {
        Cmd::from_slice(&self.command)
            .args(args)
            .cwd(&self.root)
            .timeout(self.timeout)
    }

    /// Map metafile outputs to absolute paths and entry points.
    fn read_outputs(&self, metafile: &str) -> Result<Vec<OutputFile>, CompileError> {
        let meta: Metafile = serde_json::from_str(metafile)
            .map_err(|e| CompileError::InvalidOutput(format!("metafile: {e}")))?;

        let mut outputs: Vec<_> = meta
            .outputs
            .into_iter()
            .map(|(path, output)| OutputFile {
                path: normalize_path(&self.root.join(path)),
                entry: output
                    .entry_point
                    .map(|entry| normalize_path(&self.root.join(entry))),
            })
            .collect();
        outputs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(outputs)
    }
}

#[derive(Debug, Deserialize)]
struct Metafile {
    outputs: FxHashMap<String, MetaOutput>,
}

#[derive(Debug, Deserialize)]
struct MetaOutput {
    #[serde(rename = "entryPoint")]
    entry_point: Option<String>,
}

impl ModuleCompiler for EsbuildCompiler {
    async fn bundle(&self, request: &BundleRequest) -> Result<String, CompileError> {
        debug!("bundle"; "esbuild {} (generation {})", request.entry.display(), request.generation);
        let output = self
            .cmd(self.dev_args(&request.entry))
            .run()
            .await
            .map_err(|e| CompileError::from_exec(&request.entry, e))?;

        String::from_utf8(output.stdout).map_err(|e| {
            CompileError::InvalidOutput(format!("{} is not utf-8: {e}", request.entry.display()))
        })
    }

    async fn bundle_all(
        &self,
        entries: &[NamedEntry],
        outdir: &Path,
    ) -> Result<Vec<OutputFile>, CompileError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let metafile = outdir.join(METAFILE);
        let first = &entries[0].source;

        self.cmd(self.prod_args(entries, outdir, &metafile))
            .run()
            .await
            .map_err(|e| CompileError::from_exec(first, e))?;

        let content = tokio::fs::read_to_string(&metafile)
            .await
            .map_err(|e| CompileError::InvalidOutput(format!("metafile: {e}")))?;
        // Build metadata is not part of the published output.
        tokio::fs::remove_file(&metafile).await.ok();

        self.read_outputs(&content)
    }
}
