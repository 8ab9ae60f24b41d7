//! The module compiler seam.
//!
//! The gateway never talks to a bundler directly. It hands entry points to a
//! [`ModuleCompiler`] and gets back either one self-contained ES module
//! (development) or a set of hashed output files (production).

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::route::ContentHash;
use crate::utils::exec::ExecError;

/// Single-entry compile, used per request in development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub entry: PathBuf,
    /// Gateway generation at request time. Bumped by every invalidation.
    pub generation: u64,
}

/// One named entry of a production pass. The output is `<name>.js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntry {
    pub name: String,
    pub source: PathBuf,
}

impl NamedEntry {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn page(hash: &ContentHash, source: impl Into<PathBuf>) -> Self {
        Self::new(hash.to_string(), source)
    }
}

/// A file written by a production pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Absolute path of the emitted file.
    pub path: PathBuf,
    /// Entry point that produced it, `None` for shared chunks.
    pub entry: Option<PathBuf>,
}

/// Failure of the external module compiler.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to start module compiler `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile `{}`\n{diagnostic}", entry.display())]
    Failed { entry: PathBuf, diagnostic: String },

    #[error("compiling `{}` did not finish within {}s", entry.display(), after.as_secs_f32())]
    Timeout { entry: PathBuf, after: Duration },

    #[error("module compiler produced invalid output: {0}")]
    InvalidOutput(String),

    #[error("output `{}` does not map to a known route", output.display())]
    UnmappedOutput { output: PathBuf },
}

impl CompileError {
    /// Attribute an execution failure to `entry`.
    pub fn from_exec(entry: &Path, err: ExecError) -> Self {
        match err {
            ExecError::Spawn { program, source } => Self::Spawn { program, source },
            ExecError::Timeout { after, .. } => Self::Timeout {
                entry: entry.to_path_buf(),
                after,
            },
            ExecError::Failed { status, stderr, .. } => Self::Failed {
                entry: entry.to_path_buf(),
                diagnostic: if stderr.is_empty() {
                    format!("exited with {status}")
                } else {
                    stderr
                },
            },
        }
    }

    /// Whether the compiler itself is misconfigured rather than the source.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// External JavaScript/TypeScript module compiler.
///
/// Implementations are black boxes: they inline every transitive import
/// except those of the host runtime, and report diagnostics verbatim.
pub trait ModuleCompiler: Send + Sync + 'static {
    /// Compile one entry into a self-contained, minified ES module.
    fn bundle(
        &self,
        request: &BundleRequest,
    ) -> impl Future<Output = Result<String, CompileError>> + Send;

    /// Compile every entry at once into `outdir`, one `<name>.js` per entry.
    fn bundle_all(
        &self,
        entries: &[NamedEntry],
        outdir: &Path,
    ) -> impl Future<Output = Result<Vec<OutputFile>, CompileError>> + Send;
}
