//! FILENAME: persistence/src/csv_reader.rs
//! PURPOSE: Loads CSV data into a sheet.
//! CONTEXT: Every cell is cleared first (formats are retained), then each
//! line is tokenised into fields honouring the quoting rules and each
//! field is stored by detected kind: "="-prefixed fields become formulas
//! when preservation is requested, fields that parse fully as decimal
//! numbers become numbers, everything else becomes text. Lines are mapped
//! to rows one-to-one, so a blank line keeps its (empty) row position.
//! Rows and columns beyond the sheet's dimensions are ignored. A
//! preserving load ends with a recalculation so formula caches are fresh.

use crate::PersistenceError;
use engine::Sheet;
use log::debug;
use std::fs;
use std::path::Path;

pub fn load_csv(
    sheet: &mut Sheet,
    path: &Path,
    preserve_formulas: bool,
) -> Result<(), PersistenceError> {
    let contents = fs::read_to_string(path)?;

    // Clear existing contents; cells keep their format descriptors
    for cell in sheet.cells.values_mut() {
        cell.clear();
    }
    sheet.needs_recalc = true;

    let mut loaded_rows = 0;
    for (row, line) in contents.lines().enumerate() {
        if row >= sheet.rows {
            break;
        }

        for (col, field) in split_csv_line(line).iter().enumerate() {
            if col >= sheet.cols {
                break;
            }
            if field.is_empty() {
                continue;
            }

            if preserve_formulas && field.starts_with('=') {
                sheet.set_formula(row, col, field.as_str());
            } else if let Some(number) = parse_decimal(field) {
                sheet.set_number(row, col, number);
            } else {
                sheet.set_text(row, col, field.as_str());
            }
        }
        loaded_rows = row + 1;
    }

    debug!("loaded {} row(s) from {}", loaded_rows, path.display());

    if preserve_formulas {
        sheet.recalculate();
    }

    Ok(())
}

/// Splits one CSV line into fields. A field wrapped in quotes may contain
/// commas, and a doubled quote inside it is an escaped quote character.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(ch),
            }
        }
    }
    fields.push(field);

    fields
}

/// Full-string decimal parse. Non-finite forms f64 would otherwise accept
/// ("inf", "nan", "Infinity") are not numbers here and stay text.
fn parse_decimal(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
