// src/target/csv_table.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{fs::File, path::Path};

use super::{cell_text, TargetCell};

/// Header row plus data rows of an existing CSV table.
pub fn read(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("CSV parse error at record {}", idx))?;
        records.push(rec.iter().map(str::to_string).collect::<Vec<_>>());
    }
    let mut it = records.into_iter();
    let header = it.next().unwrap_or_default();
    Ok((header, it.collect()))
}

/// Write header and rows to `file` (an already-created temp file).
pub fn write(file: &File, header: &[TargetCell], rows: &[Vec<TargetCell>]) -> Result<()> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(file);
    wtr.write_record(header.iter().map(cell_text))
        .context("writing header")?;
    for (idx, row) in rows.iter().enumerate() {
        wtr.write_record(row.iter().map(cell_text))
            .with_context(|| format!("writing row {}", idx))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}
