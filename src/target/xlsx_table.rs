// src/target/xlsx_table.rs
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, DataType, ExcelDateTime, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

use crate::source::cells;

/// Header row plus data rows of the first sheet of an existing workbook,
/// positioned from A1 and with cell types as stored.
pub fn read(path: &Path) -> Result<(Vec<Data>, Vec<Vec<Data>>)> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let range = workbook
        .worksheet_range(first)
        .with_context(|| format!("reading sheet {:?}", first))?;

    let mut rows = cells::anchored_rows(&range).into_iter();
    let header = rows.next().unwrap_or_default();
    Ok((header, rows.collect()))
}

/// Write header and rows as a single-sheet workbook at `path`. Each cell
/// keeps the type it was read with; empty cells are left blank.
pub fn write(path: &Path, header: &[Data], rows: &[Vec<Data>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let formats = DateFormats {
        date: Format::new().set_num_format("dd.mm.yyyy"),
        date_time: Format::new().set_num_format("dd.mm.yyyy hh:mm:ss"),
        duration: Format::new().set_num_format("[h]:mm:ss"),
    };

    for (r, row) in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)).enumerate() {
        let r = u32::try_from(r).context("too many rows for a worksheet")?;
        for (c, value) in row.iter().enumerate() {
            let c = u16::try_from(c).context("too many columns for a worksheet")?;
            write_cell(sheet, r, c, value, &formats)
                .with_context(|| format!("writing cell ({}, {})", r, c))?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving workbook {}", path.display()))?;
    Ok(())
}

struct DateFormats {
    date: Format,
    date_time: Format,
    duration: Format,
}

fn write_cell(
    sheet: &mut Worksheet,
    r: u32,
    c: u16,
    value: &Data,
    formats: &DateFormats,
) -> Result<()> {
    match value {
        Data::Empty => {}
        Data::String(s) if s.is_empty() => {}
        Data::String(s) => {
            sheet.write_string(r, c, s)?;
        }
        Data::Float(f) => {
            sheet.write_number(r, c, *f)?;
        }
        Data::Int(i) => {
            sheet.write_number(r, c, *i as f64)?;
        }
        Data::Bool(b) => {
            sheet.write_boolean(r, c, *b)?;
        }
        Data::DateTime(dt) if dt.is_duration() => {
            sheet.write_number_with_format(r, c, dt.as_f64(), &formats.duration)?;
        }
        Data::DateTime(dt) => {
            let serial = excel_serial(value, dt);
            let format = if serial.fract() == 0.0 {
                &formats.date
            } else {
                &formats.date_time
            };
            sheet.write_number_with_format(r, c, serial, format)?;
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => {
            sheet.write_string(r, c, s)?;
        }
        Data::Error(e) => {
            sheet.write_string(r, c, e.to_string())?;
        }
    }
    Ok(())
}

/// Serial day number in the 1900 date system the written workbook uses.
/// Workbooks stored in the 1904 system are shifted through the decoded
/// date so the calendar value stays the same.
fn excel_serial(cell: &Data, dt: &ExcelDateTime) -> f64 {
    let Some(when) = cell.as_datetime() else {
        return dt.as_f64();
    };
    let epoch: NaiveDateTime = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (when - epoch).num_milliseconds() as f64 / 86_400_000.0
}
