// src/source/mod.rs
//! Reading class roster tables from disk and turning their rows into
//! `SourceRow`s.

pub mod cells;
pub mod filter;
pub mod row;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MergeError, MergeResult};

pub use filter::{Filtered, RejectionCounts, RowFilter, RowRejection};
pub use row::SourceRow;

/// Raw cells of one table row, rendered to text. Missing cells are "".
pub type RawRow = Vec<String>;

/// Underlying file format, chosen by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    /// xlsx / xlsm / xls / ods, read through calamine.
    Workbook,
    Csv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Some(TableFormat::Workbook),
            "csv" => Some(TableFormat::Csv),
            _ => None,
        }
    }
}

/// Every row of one source table, in stored order.
#[derive(Debug)]
pub struct SourceTable {
    pub path: PathBuf,
    /// Class the table's students belong to, taken from the file stem.
    pub class_label: String,
    pub rows: Vec<RawRow>,
}

/// File stem without directories or extension: `/x/5A.xlsx` → `5A`.
pub fn class_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Load a source table. Failures map to `SourceUnreadable` (or
/// `UnsupportedFormat`) so the caller can skip the file and carry on.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_source(path: &Path) -> MergeResult<SourceTable> {
    let format =
        TableFormat::from_path(path).ok_or_else(|| MergeError::UnsupportedFormat(path.into()))?;
    let rows = match format {
        TableFormat::Workbook => read_workbook_rows(path),
        TableFormat::Csv => read_csv_rows(path),
    }
    .map_err(|e| MergeError::source_unreadable(path, e))?;

    debug!(rows = rows.len(), "loaded source table");
    Ok(SourceTable {
        path: path.to_path_buf(),
        class_label: class_label(path),
        rows,
    })
}

/// All rows of the first worksheet, positioned from A1 so the fixed column
/// layout holds even when column A is empty. The first row is not treated
/// as a header; the row filter removes header-like rows.
pub fn read_workbook_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names.first().context("workbook has no sheets")?;
    let range = workbook
        .worksheet_range(first)
        .with_context(|| format!("reading sheet {:?}", first))?;

    Ok(cells::anchored_rows(&range)
        .iter()
        .map(|r| r.iter().map(cells::render).collect())
        .collect())
}

/// All records of a CSV file, no header row, ragged widths allowed.
/// Invalid UTF-8 is replaced rather than failing the table.
pub fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, rec) in rdr.byte_records().enumerate() {
        let rec = rec.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(
            rec.iter()
                .map(|b| String::from_utf8_lossy(b).trim().to_string())
                .collect(),
        );
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn format_by_extension() {
        assert_eq!(
            TableFormat::from_path(Path::new("a/5A.XLSX")),
            Some(TableFormat::Workbook)
        );
        assert_eq!(
            TableFormat::from_path(Path::new("5B.xls")),
            Some(TableFormat::Workbook)
        );
        assert_eq!(
            TableFormat::from_path(Path::new("5B.csv")),
            Some(TableFormat::Csv)
        );
        assert_eq!(TableFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(TableFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn class_label_is_file_stem() {
        assert_eq!(class_label(Path::new("/data/rosters/5A.xlsx")), "5A");
        assert_eq!(class_label(Path::new("11 Б.csv")), "11 Б");
    }

    #[test]
    fn reads_csv_rows_verbatim() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("7C.csv");
        fs::write(&path, "a, b ,c\n\"x,y\",z\n")?;

        let table = read_source(&path)?;
        assert_eq!(table.class_label, "7C");
        assert_eq!(
            table.rows,
            vec![
                vec!["a".to_string(), "b".into(), "c".into()],
                vec!["x,y".to_string(), "z".into()],
            ]
        );
        Ok(())
    }

    #[test]
    fn corrupt_workbook_is_unreadable() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("5A.xlsx");
        fs::write(&path, b"this is not a zip archive")?;

        let err = read_source(&path).unwrap_err();
        assert!(matches!(err, MergeError::SourceUnreadable { .. }));
        Ok(())
    }

    #[test]
    fn workbook_with_empty_first_column_keeps_positions() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("5A.xlsx");
        let cells = [
            "", "01.09.2020", "Ivanov Petr Ivanovich", "M", "01.01.2013", "addr",
            "father", "doc", "Ivanov Ivan", "02.02.1980", "snils", "work", "555", "a@b.c",
        ];
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (c, value) in cells.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(0, c as u16, *value)?;
            }
        }
        workbook.save(&path)?;

        let rows = read_workbook_rows(&path)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), row::SOURCE_WIDTH);
        assert_eq!(rows[0][0], "");
        assert_eq!(rows[0][row::STUDENT_NAME], "Ivanov Petr Ivanovich");
        assert_eq!(rows[0][row::GUARDIAN_EMAIL], "a@b.c");
        Ok(())
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = read_source(Path::new("roster.txt")).unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedFormat(_)));
    }
}
