// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Failures a merge run can report.
///
/// Per-file problems (`SourceUnreadable`, `UnsupportedFormat`) are recovered by
/// skipping the file; everything else ends the run.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("cannot read source table {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("unsupported table format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("cannot write target table {path}: {reason}")]
    TargetUnwritable { path: PathBuf, reason: String },

    #[error("no source tables were selected")]
    NoSources,

    #[error("no target table was selected")]
    NoTarget,

    #[error("nothing to process")]
    NothingToProcess,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MergeError {
    pub fn source_unreadable(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        MergeError::SourceUnreadable {
            path: path.into(),
            reason: format!("{:#}", err),
        }
    }

    pub fn target_unwritable(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        MergeError::TargetUnwritable {
            path: path.into(),
            reason: format!("{:#}", err),
        }
    }
}

pub type MergeResult<T> = Result<T, MergeError>;
