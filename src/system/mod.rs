//! Override resolution for the `document`, `not-found` and `error` files.
//!
//! An application may provide `<system>/<name>.js` or `<system>/<name>.ts`.
//! Without one, the packaged default `<defaults>/system/<name>.js` is used.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::route::kind::SOURCE_EXTENSIONS;

/// Subdirectory of the defaults dir holding the packaged system files.
pub const SYSTEM_SUBDIR: &str = "system";

/// Logical system files an application can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemFile {
    Document,
    NotFound,
    Error,
}

impl SystemFile {
    pub const ALL: [Self; 3] = [Self::Document, Self::NotFound, Self::Error];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::NotFound => "not-found",
            Self::Error => "error",
        }
    }

    /// `<defaults_dir>/system/<name>.js`
    pub fn packaged_path(self, defaults_dir: &Path) -> PathBuf {
        defaults_dir
            .join(SYSTEM_SUBDIR)
            .join(format!("{}.js", self.name()))
    }

    const fn index(self) -> usize {
        match self {
            Self::Document => 0,
            Self::NotFound => 1,
            Self::Error => 2,
        }
    }
}

impl fmt::Display for SystemFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum OverrideError {
    /// Both `<name>.js` and `<name>.ts` exist.
    #[error("ambiguous `{file}` override: {}", format_candidates(.candidates))]
    Ambiguous {
        file: SystemFile,
        candidates: Vec<PathBuf>,
    },
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|p| format!("`{}`", p.display()))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// An I/O error other than not-found while probing an override.
#[derive(Debug, Error)]
#[error("failed to probe `{}`", .path.display())]
pub struct ProbeError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOrigin {
    User,
    Packaged,
}

/// Result of resolving one system file.
#[derive(Debug)]
pub struct ResolvedOverride {
    pub file: SystemFile,
    pub source: PathBuf,
    pub origin: OverrideOrigin,
    /// Probe failures that were treated as absence. The caller logs them.
    pub probe_errors: Vec<ProbeError>,
}

/// Pick the user override of `file` if one exists, else the packaged default.
///
/// Not-found probes are the expected case. Other probe errors also fall
/// back to the default and are reported through `probe_errors`.
pub async fn resolve_override(
    user_dir: &Path,
    file: SystemFile,
    defaults_dir: &Path,
) -> Result<ResolvedOverride, OverrideError> {
    let mut candidates = Vec::new();
    let mut probe_errors = Vec::new();

    for ext in SOURCE_EXTENSIONS {
        let path = user_dir.join(format!("{}.{ext}", file.name()));
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => candidates.push(path),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => probe_errors.push(ProbeError { path, source }),
        }
    }

    match candidates.len() {
        0 => Ok(ResolvedOverride {
            file,
            source: file.packaged_path(defaults_dir),
            origin: OverrideOrigin::Packaged,
            probe_errors,
        }),
        1 => Ok(ResolvedOverride {
            file,
            source: candidates.remove(0),
            origin: OverrideOrigin::User,
            probe_errors,
        }),
        _ => Err(OverrideError::Ambiguous { file, candidates }),
    }
}

/// Memo of resolved system files, reset on every re-scan.
#[derive(Debug, Default)]
pub struct OverrideMemo {
    slots: [Option<PathBuf>; 3],
}

impl OverrideMemo {
    pub fn get(&self, file: SystemFile) -> Option<&PathBuf> {
        self.slots[file.index()].as_ref()
    }

    pub fn set(&mut self, file: SystemFile, source: PathBuf) {
        self.slots[file.index()] = Some(source);
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}
