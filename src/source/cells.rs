// src/source/cells.rs
use calamine::{Data, DataType, Range};

/// Text form of a spreadsheet cell.
///
/// Whole-number floats lose their `.0` (file numbers are usually stored as
/// numbers), and date cells come out as `DD.MM.YYYY` so date extraction
/// treats them like typed-in dates.
pub fn render(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string().trim().to_string(),
    }
}

/// Rows of `range` positioned from A1.
///
/// calamine starts a range at the first used cell, so a sheet whose column A
/// (or row 1) is empty everywhere would otherwise shift every position.
pub fn anchored_rows(range: &Range<Data>) -> Vec<Vec<Data>> {
    let Some((r0, c0)) = range.start() else {
        return Vec::new();
    };
    let lead = c0 as usize;
    let blank_rows = (0..r0).map(|_| Vec::new());
    let rows = range.rows().map(|r| {
        let mut row = vec![Data::Empty; lead];
        row.extend(r.iter().cloned());
        row
    });
    blank_rows.chain(rows).collect()
}

fn render_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
