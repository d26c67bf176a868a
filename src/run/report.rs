// src/run/report.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt::Write as _, path::PathBuf};

use crate::merge::OutcomeCounts;
use crate::source::RejectionCounts;
use crate::stats::ClassStats;
use crate::target::WriteResult;

/// How one source table went.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub path: PathBuf,
    pub class_label: String,
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rejected: RejectionCounts,
    pub outcomes: OutcomeCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Merged(TableSummary),
    Failed { path: PathBuf, error: String },
}

impl FileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files: Vec<FileOutcome>,
    pub total_students: usize,
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rejected: RejectionCounts,
    pub outcomes: OutcomeCounts,
    pub classes: ClassStats,
    pub write: WriteResult,
}

impl RunReport {
    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    /// Console summary: target, unique students, per-class counts and
    /// member lists. Failures are left to the diagnostics.
    pub fn render_summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "All records appended to {}.", self.write.path.display());
        let _ = writeln!(s, "Total unique students: {}", self.total_students);
        let _ = writeln!(s, "Per class:");
        for (class, entry) in self.classes.iter() {
            let members: Vec<&str> = entry.members.iter().map(|m| m.as_str()).collect();
            let _ = writeln!(s, "  {}: {} students", class, entry.count);
            let _ = writeln!(s, "    Students: {}", members.join(", "));
        }
        s
    }
}
