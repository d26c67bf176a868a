// src/source/filter.rs
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::row::SourceRow;
use super::RawRow;
use crate::config::Config;

/// Why a raw row never reached the merge engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    /// Every cell empty.
    Blank,
    /// Fewer non-empty cells than the configured minimum.
    Sparse { populated: usize },
    /// A cell matches a header keyword (repeated header line).
    Header { cell: String },
    /// Not enough columns to address every roster field.
    Narrow { width: usize },
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::Blank => write!(f, "blank"),
            RowRejection::Sparse { populated } => write!(f, "sparse ({} cells)", populated),
            RowRejection::Header { cell } => write!(f, "header ({:?})", cell),
            RowRejection::Narrow { width } => write!(f, "narrow ({} columns)", width),
        }
    }
}

/// Rejection tallies for one table or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub blank: usize,
    pub sparse: usize,
    pub header: usize,
    pub narrow: usize,
}

impl RejectionCounts {
    pub fn add(&mut self, r: &RowRejection) {
        match r {
            RowRejection::Blank => self.blank += 1,
            RowRejection::Sparse { .. } => self.sparse += 1,
            RowRejection::Header { .. } => self.header += 1,
            RowRejection::Narrow { .. } => self.narrow += 1,
        }
    }

    pub fn merge(&mut self, other: &RejectionCounts) {
        self.blank += other.blank;
        self.sparse += other.sparse;
        self.header += other.header;
        self.narrow += other.narrow;
    }

    pub fn total(&self) -> usize {
        self.blank + self.sparse + self.header + self.narrow
    }
}

/// Accepted rows (with their index in the source table) and the tallies of
/// everything dropped.
#[derive(Debug, Default)]
pub struct Filtered {
    pub rows: Vec<(usize, SourceRow)>,
    pub rejected: RejectionCounts,
}

pub struct RowFilter {
    header_keywords: HashSet<String>,
    min_populated: usize,
}

impl RowFilter {
    pub fn new(cfg: &Config) -> Self {
        Self {
            header_keywords: cfg.header_set(),
            min_populated: cfg.min_populated_cells,
        }
    }

    /// Decide a single row. Checks run blank → sparse → header → width.
    pub fn check(&self, row: &[String]) -> Result<SourceRow, RowRejection> {
        let populated = row.iter().filter(|c| !c.trim().is_empty()).count();
        if populated == 0 {
            return Err(RowRejection::Blank);
        }
        if populated < self.min_populated {
            return Err(RowRejection::Sparse { populated });
        }
        if let Some(cell) = row
            .iter()
            .map(|c| c.trim())
            .find(|c| self.header_keywords.contains(*c))
        {
            return Err(RowRejection::Header {
                cell: cell.to_string(),
            });
        }
        SourceRow::from_cells(row)
    }

    /// Run every row of a table through `check`, keeping table order.
    pub fn filter(&self, rows: &[RawRow]) -> Filtered {
        let mut out = Filtered::default();
        for (idx, row) in rows.iter().enumerate() {
            match self.check(row) {
                Ok(r) => out.rows.push((idx, r)),
                Err(RowRejection::Narrow { width }) => {
                    tracing::warn!(row = idx, width, "row has too few columns; skipped");
                    out.rejected.add(&RowRejection::Narrow { width });
                }
                Err(reason) => {
                    tracing::trace!(row = idx, %reason, "row skipped");
                    out.rejected.add(&reason);
                }
            }
        }
        out
    }
}
