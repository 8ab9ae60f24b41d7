//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::bundler::AssetKind;

/// Kvikk file-system router and asset gateway CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: kvikk.toml)
    #[arg(short = 'C', long, default_value = "kvikk.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Override the base path every route and asset URL is prefixed with
    #[arg(short, long, global = true)]
    pub base: Option<String>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Bundle every page ahead of time for production
    #[command(visible_alias = "b")]
    Build,

    /// List discovered routes
    #[command(visible_alias = "r")]
    Routes {
        /// Print the route table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve one asset the way the gateway serves it
    Resolve {
        /// Asset kind: page, component, layout or module
        kind: AssetKind,

        /// Route hash, component or layout name, or module specifier
        id: String,

        /// Look up pre-built output instead of compiling
        #[arg(short = 'P', long)]
        production: bool,
    },

    /// Re-scan routes whenever source files change
    #[command(visible_alias = "w")]
    Watch,
}
