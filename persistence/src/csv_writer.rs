//! FILENAME: persistence/src/csv_writer.rs
//! PURPOSE: Writes a sheet's used range to a CSV file.
//! CONTEXT: Two modes: flattened (every cell emits its display value) and
//! formula-preserving (formula cells emit their raw "=..." expression
//! text instead). Fields containing commas, quotes or line breaks are
//! quoted with internal quotes doubled; rows are terminated by '\n'.

use crate::PersistenceError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use engine::{format_cell_value, Sheet};
use log::debug;
use std::path::Path;

pub fn save_csv(
    sheet: &Sheet,
    path: &Path,
    preserve_formulas: bool,
) -> Result<(), PersistenceError> {
    // The used range: the smallest rectangle from (0,0) covering every
    // non-empty cell. An empty sheet still writes one blank row.
    let (max_row, max_col) = sheet.used_extent().unwrap_or((0, 0));

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)?;

    for row in 0..=max_row {
        let mut record = Vec::with_capacity(max_col + 1);
        for col in 0..=max_col {
            record.push(field_text(sheet, row, col, preserve_formulas));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    debug!("saved {} row(s) to {}", max_row + 1, path.display());
    Ok(())
}

/// The text a cell contributes to its CSV field.
fn field_text(sheet: &Sheet, row: usize, col: usize, preserve_formulas: bool) -> String {
    match sheet.get(row, col) {
        Some(cell) if !cell.is_empty() => {
            if preserve_formulas {
                if let Some(expression) = cell.formula_expression() {
                    return expression.to_string();
                }
            }
            format_cell_value(cell)
        }
        _ => String::new(),
    }
}
