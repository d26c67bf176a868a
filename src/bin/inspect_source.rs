use enrollmerge::{
    source::{read_source, RowFilter},
    Config,
};
use std::{env, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to a roster table.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <SOURCE_TABLE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print every raw row with the filter's verdict.
fn inspect(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = read_source(path)?;
    let filter = RowFilter::new(&Config::default());

    println!("=== {} (class {}) ===", path.display(), table.class_label);
    println!("Rows: {}", table.rows.len());
    println!();

    let mut accepted = 0;
    for (i, row) in table.rows.iter().enumerate() {
        let verdict = match filter.check(row) {
            Ok(r) => {
                accepted += 1;
                format!("ok    student={:?} guardian={:?}", r.student_name, r.guardian_name)
            }
            Err(reason) => format!("skip  {}", reason),
        };
        println!("{:>5} | {:<60} | {}", i, verdict, row.join(" | "));
    }

    println!();
    println!("Accepted {} of {} rows", accepted, table.rows.len());
    Ok(())
}
