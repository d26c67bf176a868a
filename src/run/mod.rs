// src/run/mod.rs
//! One merge run: read every source table in order, fold their rows into a
//! single merge map, then append the result to the target table.

pub mod discover;
pub mod report;

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{MergeError, MergeResult};
use crate::merge::{MergeMap, MergeOutcome, OutcomeCounts};
use crate::normalize::GenderRules;
use crate::source::{self, RejectionCounts, RowFilter, SourceTable};
use crate::stats::ClassStats;
use crate::target;

pub use discover::discover_sources;
pub use report::{FileOutcome, RunReport, TableSummary};

/// State owned by a single run. Created by the caller, threaded through every
/// table, and consumed when the records are handed to the writer.
pub struct RunContext {
    merged: MergeMap,
    classes: ClassStats,
    filter: RowFilter,
    rules: GenderRules,
}

impl RunContext {
    pub fn new(cfg: &Config) -> Self {
        Self {
            merged: MergeMap::new(),
            classes: ClassStats::new(),
            filter: RowFilter::new(cfg),
            rules: GenderRules::from_config(cfg),
        }
    }

    pub fn merged(&self) -> &MergeMap {
        &self.merged
    }

    pub fn classes(&self) -> &ClassStats {
        &self.classes
    }

    /// Filter and fold every row of `table`, in stored order.
    pub fn ingest_table(&mut self, table: &SourceTable) -> TableSummary {
        let filtered = self.filter.filter(&table.rows);
        let mut outcomes = OutcomeCounts::default();

        for (_, row) in &filtered.rows {
            let (id, outcome) = self.merged.merge(row, &table.class_label, &self.rules);
            if outcome == MergeOutcome::Created {
                self.classes.record(&table.class_label, id);
            }
            outcomes.add(outcome);
        }

        TableSummary {
            path: table.path.clone(),
            class_label: table.class_label.clone(),
            rows_read: table.rows.len(),
            rows_accepted: filtered.rows.len(),
            rejected: filtered.rejected,
            outcomes,
        }
    }

    /// Read and ingest one file. A file that cannot be read is reported and
    /// skipped; it never aborts the run.
    #[tracing::instrument(level = "info", skip(self, path), fields(file = %path.display()))]
    pub fn ingest_file(&mut self, path: &Path) -> FileOutcome {
        info!("processing started");
        match source::read_source(path) {
            Ok(table) => {
                let summary = self.ingest_table(&table);
                info!(
                    class = %summary.class_label,
                    read = summary.rows_read,
                    accepted = summary.rows_accepted,
                    "processing finished"
                );
                FileOutcome::Merged(summary)
            }
            Err(e) => {
                error!("failed to process: {}", e);
                FileOutcome::Failed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }
            }
        }
    }

    pub fn into_parts(self) -> (MergeMap, ClassStats) {
        (self.merged, self.classes)
    }
}

fn log_class_summary(total: usize, classes: &ClassStats) {
    info!("unique students: {}", total);
    for (class, entry) in classes.iter() {
        info!("class {}: {} students", class, entry.count);
        let members: Vec<&str> = entry.members.iter().map(|m| m.as_str()).collect();
        info!("class {} students: {}", class, members.join(", "));
    }
}

/// Merge `sources` (in order) and append the result to `target`.
///
/// Returns `NothingToProcess` without touching the target when no row from
/// any table survived; a target that cannot be written fails the run.
pub fn run(sources: &[PathBuf], target: &Path, cfg: &Config) -> MergeResult<RunReport> {
    if sources.is_empty() {
        return Err(MergeError::NoSources);
    }
    if target.as_os_str().is_empty() {
        return Err(MergeError::NoTarget);
    }

    let started_at = Utc::now();
    let mut ctx = RunContext::new(cfg);
    let files: Vec<FileOutcome> = sources.iter().map(|p| ctx.ingest_file(p)).collect();

    if ctx.merged().is_empty() {
        info!("no usable rows in {} source tables", sources.len());
        return Err(MergeError::NothingToProcess);
    }

    let (merged, classes) = ctx.into_parts();
    let total_students = merged.len();
    log_class_summary(total_students, &classes);

    let write = target::write(target, merged.into_records())?;

    let mut rejected = RejectionCounts::default();
    let mut outcomes = OutcomeCounts::default();
    let (mut rows_read, mut rows_accepted) = (0, 0);
    for f in &files {
        if let FileOutcome::Merged(t) = f {
            rows_read += t.rows_read;
            rows_accepted += t.rows_accepted;
            rejected.merge(&t.rejected);
            outcomes.merge(&t.outcomes);
        }
    }

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        files,
        total_students,
        rows_read,
        rows_accepted,
        rejected,
        outcomes,
        classes,
        write,
    })
}
