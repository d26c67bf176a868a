// src/run/discover.rs
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::error::{MergeError, MergeResult};
use crate::source::TableFormat;

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

fn is_supported(path: &Path) -> bool {
    path.is_file() && TableFormat::from_path(path).is_some()
}

/// Expand CLI source arguments into table paths.
///
/// A directory contributes its supported files (non-recursive, sorted by
/// name), a glob pattern its matches in glob order, anything else is taken
/// as a file path as-is so an unreadable file shows up as a failed source.
pub fn discover_sources<S: AsRef<str>>(args: &[S]) -> MergeResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        let path = Path::new(arg);

        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(path)
                .map_err(|e| MergeError::source_unreadable(path, e))?
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| is_supported(p))
                .collect();
            found.sort();
            info!(dir = %path.display(), files = found.len(), "scanned source directory");
            out.extend(found);
        } else if is_pattern(arg) {
            let entries = glob(arg).map_err(|e| MergeError::Config(format!("{}: {}", arg, e)))?;
            let before = out.len();
            out.extend(entries.filter_map(Result::ok).filter(|p| is_supported(p)));
            if out.len() == before {
                warn!(pattern = arg, "pattern matched no source tables");
            }
        } else {
            out.push(path.to_path_buf());
        }
    }
    info!("selected {} source tables", out.len());
    Ok(out)
}
