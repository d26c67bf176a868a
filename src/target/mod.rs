// src/target/mod.rs
//! The consolidated table merged records are appended to.

pub mod csv_table;
pub mod xlsx_table;

use anyhow::{Context, Result};
use calamine::Data;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::{MergeError, MergeResult};
use crate::merge::{MergedRecord, TARGET_COLUMNS, TARGET_HEADER};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetFormat {
    Xlsx,
    Csv,
}

impl TargetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(TargetFormat::Xlsx),
            "csv" => Some(TargetFormat::Csv),
            _ => None,
        }
    }
}

/// Legacy `.xls` cannot be written, so such a target becomes `.xlsx`
/// next to it.
pub fn resolve_target_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xls") => path.with_extension("xlsx"),
        _ => path.to_path_buf(),
    }
}

/// Pad with "" or truncate so the row is exactly `width` cells.
pub fn normalize_width(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

/// A cell of the target table. Rows already in an xlsx table keep the type
/// they were stored with; CSV cells and new rows are strings.
pub type TargetCell = Data;

/// Field text of a cell, as written to CSV.
pub fn cell_text(cell: &TargetCell) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_cell(value: String) -> TargetCell {
    if value.is_empty() {
        Data::Empty
    } else {
        Data::String(value)
    }
}

/// Result of appending a batch to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub path: PathBuf,
    /// The table did not exist before this run.
    pub created: bool,
    /// Data-row index at which this batch starts.
    pub append_start: usize,
    pub appended: usize,
    /// Data rows in the table after the write.
    pub total_rows: usize,
}

/// Target table held in memory between load and persist.
#[derive(Debug)]
pub struct TargetTable {
    path: PathBuf,
    format: TargetFormat,
    header: Vec<TargetCell>,
    rows: Vec<Vec<TargetCell>>,
    created: bool,
    append_start: usize,
}

impl TargetTable {
    /// Load the table at `path`, or start a new one with the fixed header if
    /// nothing exists there yet. A new table reaches disk only on `persist`.
    pub fn open_or_create(path: &Path) -> MergeResult<Self> {
        let path = resolve_target_path(path);
        let format = TargetFormat::from_path(&path)
            .ok_or_else(|| MergeError::UnsupportedFormat(path.clone()))?;

        let (header, rows, created) = if path.exists() {
            let (header, rows) = match format {
                TargetFormat::Xlsx => xlsx_table::read(&path),
                TargetFormat::Csv => csv_table::read(&path).map(|(header, rows)| {
                    let text_row = |row: Vec<String>| -> Vec<TargetCell> {
                        row.into_iter().map(Data::String).collect()
                    };
                    (text_row(header), rows.into_iter().map(text_row).collect())
                }),
            }
            .map_err(|e| MergeError::target_unwritable(&path, e))?;
            (header, rows, false)
        } else {
            info!(path = %path.display(), "target table not found; creating");
            (Vec::new(), Vec::new(), true)
        };

        let mut names: Vec<String> = header.iter().map(cell_text).collect();
        while names.last().is_some_and(|n| n.trim().is_empty()) {
            names.pop();
        }
        let header = if names.is_empty() {
            if !created {
                info!(path = %path.display(), "target table has no header; adding it");
            }
            TARGET_HEADER.iter().map(|h| Data::String(h.to_string())).collect()
        } else {
            if names != TARGET_HEADER {
                warn!(
                    path = %path.display(),
                    columns = names.len(),
                    "target header differs from the expected schema; keeping it"
                );
            }
            header
        };

        let append_start = rows.len();
        Ok(Self {
            path,
            format,
            header,
            rows,
            created,
            append_start,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[TargetCell] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<TargetCell>] {
        &self.rows
    }

    /// Append one row after the last existing one, normalized to the
    /// schema width.
    pub fn append(&mut self, row: Vec<String>) {
        let row = normalize_width(row, TARGET_COLUMNS);
        self.rows.push(row.into_iter().map(text_cell).collect());
    }

    /// Write the whole table back. The new content goes to a temp file in the
    /// same directory which then replaces the target, so a failure leaves the
    /// previous table untouched.
    pub fn persist(&self) -> MergeResult<WriteResult> {
        self.persist_inner()
            .map_err(|e| MergeError::target_unwritable(&self.path, e))?;
        Ok(WriteResult {
            path: self.path.clone(),
            created: self.created,
            append_start: self.append_start,
            appended: self.rows.len() - self.append_start,
            total_rows: self.rows.len(),
        })
    }

    fn persist_inner(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;

        match self.format {
            TargetFormat::Xlsx => xlsx_table::write(tmp.path(), &self.header, &self.rows)?,
            TargetFormat::Csv => csv_table::write(tmp.as_file(), &self.header, &self.rows)?,
        }

        // The temp file is created owner-only; a table that already exists
        // keeps its own mode.
        if self.path.exists() {
            let perms = fs::metadata(&self.path)
                .with_context(|| format!("reading metadata of {}", self.path.display()))?
                .permissions();
            fs::set_permissions(tmp.path(), perms)
                .with_context(|| format!("setting permissions on {}", tmp.path().display()))?;
        }

        tmp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// Append `records` (in the given order) to the table at `target` and
/// persist it once.
#[tracing::instrument(level = "info", skip(target, records), fields(target = %target.display()))]
pub fn write<I>(target: &Path, records: I) -> MergeResult<WriteResult>
where
    I: IntoIterator<Item = MergedRecord>,
{
    let mut table = TargetTable::open_or_create(target)?;
    for rec in records {
        table.append(rec.to_row());
    }
    let result = table.persist()?;
    info!(
        appended = result.appended,
        start = result.append_start,
        total = result.total_rows,
        "target table written"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FullName;
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    fn record(surname: &str) -> MergedRecord {
        MergedRecord {
            student: FullName {
                surname: surname.into(),
                given: "Petr".into(),
                patronymic: String::new(),
            },
            class_label: "5A".into(),
            ..Default::default()
        }
    }

    #[test]
    fn width_is_normalized() {
        let short = normalize_width(vec!["a".into()], TARGET_COLUMNS);
        assert_eq!(short.len(), TARGET_COLUMNS);
        assert_eq!(short[0], "a");
        assert!(short[1..].iter().all(String::is_empty));

        let long = normalize_width(vec!["x".to_string(); 40], TARGET_COLUMNS);
        assert_eq!(long.len(), TARGET_COLUMNS);
    }

    #[test]
    fn xls_target_becomes_xlsx() {
        assert_eq!(
            resolve_target_path(Path::new("out/all.XLS")),
            PathBuf::from("out/all.xlsx")
        );
        assert_eq!(
            resolve_target_path(Path::new("out/all.csv")),
            PathBuf::from("out/all.csv")
        );
    }

    #[test]
    fn creates_csv_with_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.csv");

        let res = write(&path, vec![record("Ivanov")])?;
        assert!(res.created);
        assert_eq!(res.append_start, 0);
        assert_eq!(res.appended, 1);

        let (header, rows) = csv_table::read(&path)?;
        assert_eq!(header, TARGET_HEADER.to_vec());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), TARGET_COLUMNS);
        assert_eq!(rows[0][0], "Ivanov");
        assert_eq!(rows[0][7], "5A");
        Ok(())
    }

    #[test]
    fn appends_after_existing_rows_untouched() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.csv");
        let mut existing = TARGET_HEADER.join(",");
        existing.push_str("\nOld,Row,,,,,,9Z\nOlder,\"Quoted, cell\",x\n");
        fs::write(&path, &existing)?;

        let res = write(&path, vec![record("New1"), record("New2")])?;
        assert!(!res.created);
        assert_eq!(res.append_start, 2);
        assert_eq!(res.total_rows, 4);

        let (_, rows) = csv_table::read(&path)?;
        assert_eq!(rows[0], vec!["Old", "Row", "", "", "", "", "", "9Z"]);
        assert_eq!(rows[1], vec!["Older", "Quoted, cell", "x"]);
        assert_eq!(rows[2][0], "New1");
        assert_eq!(rows[3][0], "New2");
        Ok(())
    }

    #[test]
    fn xlsx_create_then_append() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.xlsx");

        write(&path, vec![record("First")])?;
        let res = write(&path, vec![record("Second")])?;
        assert_eq!(res.append_start, 1);
        assert_eq!(res.total_rows, 2);

        let (header, rows) = xlsx_table::read(&path)?;
        assert_eq!(header.len(), TARGET_COLUMNS);
        assert_eq!(cell_text(&header[0]), "StudentSurname");
        assert_eq!(cell_text(&rows[0][0]), "First");
        assert_eq!(cell_text(&rows[1][0]), "Second");
        assert_eq!(cell_text(&rows[1][7]), "5A");
        Ok(())
    }

    fn excel_serial(date: NaiveDateTime) -> f64 {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (date - epoch).num_milliseconds() as f64 / 86_400_000.0
    }

    #[test]
    fn existing_xlsx_cells_are_not_rewritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.xlsx");
        let admitted = NaiveDate::from_ymd_opt(2015, 9, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (c, name) in TARGET_HEADER.iter().enumerate() {
            sheet.write_string(0, c as u16, *name)?;
        }
        sheet.write_string(1, 0, "  Padded  ")?;
        sheet.write_number(1, 5, 17.0)?;
        let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm");
        sheet.write_number_with_format(1, 6, excel_serial(admitted), &stamp)?;
        workbook.save(&path)?;

        let res = write(&path, vec![record("Ivanov")])?;
        assert_eq!(res.append_start, 1);

        let (_, rows) = xlsx_table::read(&path)?;
        assert_eq!(rows[0][0], Data::String("  Padded  ".into()));
        assert_eq!(rows[0][5], Data::Float(17.0));
        let Data::DateTime(dt) = &rows[0][6] else {
            panic!("expected a date cell, got {:?}", rows[0][6]);
        };
        assert!((dt.as_f64() - excel_serial(admitted)).abs() < 1e-6);
        assert_eq!(cell_text(&rows[1][0]), "Ivanov");
        Ok(())
    }

    #[test]
    fn differing_header_is_kept() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.csv");
        fs::write(&path, "Name,Class\nSmirnov,9Z\n")?;

        let table = TargetTable::open_or_create(&path)?;
        assert_eq!(table.header().len(), 2);

        let res = write(&path, vec![record("Ivanov")])?;
        assert!(!res.created);
        assert_eq!(res.append_start, 1);

        let (header, rows) = csv_table::read(&path)?;
        assert_eq!(header, vec!["Name", "Class"]);
        assert_eq!(rows[0], vec!["Smirnov", "9Z"]);
        assert_eq!(rows[1].len(), TARGET_COLUMNS);
        assert_eq!(rows[1][0], "Ivanov");
        Ok(())
    }

    #[test]
    fn empty_existing_csv_gets_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.csv");
        fs::write(&path, "")?;

        let res = write(&path, vec![record("Ivanov")])?;
        assert!(!res.created);
        assert_eq!(res.append_start, 0);

        let (header, rows) = csv_table::read(&path)?;
        assert_eq!(header, TARGET_HEADER.to_vec());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Ivanov");
        Ok(())
    }

    #[test]
    fn empty_existing_workbook_gets_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path)?;

        write(&path, vec![record("Ivanov")])?;

        let (header, rows) = xlsx_table::read(&path)?;
        assert_eq!(cell_text(&header[28]), "G2Email");
        assert_eq!(rows.len(), 1);
        assert_eq!(cell_text(&rows[0][0]), "Ivanov");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn existing_target_keeps_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let path = dir.path().join("all.csv");
        fs::write(&path, TARGET_HEADER.join(","))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;

        write(&path, vec![record("Ivanov")])?;
        assert_eq!(fs::metadata(&path)?.permissions().mode() & 0o777, 0o644);
        Ok(())
    }

    #[test]
    fn unwritable_target_reports_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing-dir").join("all.csv");

        let err = write(&path, vec![record("Ivanov")]).unwrap_err();
        assert!(matches!(err, MergeError::TargetUnwritable { .. }));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn unsupported_target_extension() {
        let err = TargetTable::open_or_create(Path::new("all.json")).unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedFormat(_)));
    }
}
