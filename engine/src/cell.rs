//! FILENAME: engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single spreadsheet cell.
//! CONTEXT: This file contains the `Cell` struct, the `CellContent` enum and
//! the `CellError` enum. It separates the user's input (formula expression)
//! from the calculated result (cached value or text). The format descriptor
//! and display attributes survive content changes and clears.

use crate::style::{Alignment, DataFormat, FormatStyle};
use serde::{Deserialize, Serialize};

/// Represents the possible errors a formula cell can hold (e.g., #DIV/0!)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellError {
    DivZero, // Division by zero
    Ref,     // Invalid or out-of-range reference, or a reference cycle
    Value,   // Wrong type of operand (text in a numeric context)
    Parse,   // Formula parsing error
    Na,      // Lookup key not found
}

/// The content of a cell: exactly one of empty, number, text, or formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellContent {
    Empty,
    Number(f64),
    Text(String),
    Formula {
        /// The original expression text, including the leading '='.
        expression: String,
        /// Cached scalar result; only meaningful when `error` is None
        /// and `is_text_result` is false.
        cached_value: f64,
        /// Cached text result for formulas that produce text (string IF
        /// branches, text XLOOKUP hits).
        cached_text: Option<String>,
        is_text_result: bool,
        error: Option<CellError>,
    },
}

/// The atomic unit of the spreadsheet.
///
/// The stored (row, col) position is redundant with the cell's grid slot;
/// it is kept so detached copies (clipboards) remember where they came from.
/// Structural edits re-stamp it when cells move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub content: CellContent,

    // Formatting properties
    pub format: DataFormat,
    pub format_style: FormatStyle,

    // Display properties
    pub width: i32,
    pub precision: usize,
    pub align: Alignment,

    /// Foreground colour index (0-15, or -1 for default)
    pub text_color: i32,
    /// Background colour index (0-15, or -1 for default)
    pub background_color: i32,
    /// Custom row height override (-1 for default)
    pub row_height: i32,
}

impl Cell {
    /// Creates a new empty cell at the given position with default
    /// formatting. Numbers align right by default.
    pub fn new(row: usize, col: usize) -> Self {
        Cell {
            row,
            col,
            content: CellContent::Empty,
            format: DataFormat::General,
            format_style: FormatStyle::default(),
            width: 10,
            precision: 2,
            align: Alignment::Right,
            text_color: -1,
            background_color: -1,
            row_height: -1,
        }
    }

    /// Replaces the content with a number. Formatting is retained.
    pub fn set_number(&mut self, value: f64) {
        self.content = CellContent::Number(value);
    }

    /// Replaces the content with text. Text aligns left.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = CellContent::Text(text.into());
        self.align = Alignment::Left;
    }

    /// Replaces the content with a formula. The cache starts cold and the
    /// sheet must be recalculated before the value is meaningful.
    pub fn set_formula(&mut self, expression: impl Into<String>) {
        self.content = CellContent::Formula {
            expression: expression.into(),
            cached_value: 0.0,
            cached_text: None,
            is_text_result: false,
            error: None,
        };
    }

    /// Clears the content back to empty. The format descriptor, colours
    /// and display attributes are kept.
    pub fn clear(&mut self) {
        self.content = CellContent::Empty;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    /// Returns the formula expression text, if this is a formula cell.
    pub fn formula_expression(&self) -> Option<&str> {
        match &self.content {
            CellContent::Formula { expression, .. } => Some(expression),
            _ => None,
        }
    }

    /// Returns the stored error of a formula cell, if any.
    pub fn formula_error(&self) -> Option<CellError> {
        match &self.content {
            CellContent::Formula { error, .. } => *error,
            _ => None,
        }
    }

    /// Copies the display and formatting attributes (not the content or
    /// position) from another cell. Used by the copy/paste paths.
    pub fn copy_attributes_from(&mut self, other: &Cell) {
        self.format = other.format;
        self.format_style = other.format_style;
        self.width = other.width;
        self.precision = other.precision;
        self.align = other.align;
        self.text_color = other.text_color;
        self.background_color = other.background_color;
        self.row_height = other.row_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_is_empty_with_defaults() {
        let cell = Cell::new(3, 4);
        assert!(cell.is_empty());
        assert_eq!(cell.row, 3);
        assert_eq!(cell.col, 4);
        assert_eq!(cell.precision, 2);
        assert_eq!(cell.align, Alignment::Right);
        assert_eq!(cell.text_color, -1);
    }

    #[test]
    fn setting_text_aligns_left() {
        let mut cell = Cell::new(0, 0);
        cell.set_text("hello");
        assert_eq!(cell.align, Alignment::Left);
        assert_eq!(cell.content, CellContent::Text("hello".to_string()));
    }

    #[test]
    fn clear_keeps_format() {
        let mut cell = Cell::new(0, 0);
        cell.format = DataFormat::Currency;
        cell.set_number(12.5);
        cell.clear();
        assert!(cell.is_empty());
        assert_eq!(cell.format, DataFormat::Currency);
    }

    #[test]
    fn formula_cache_starts_cold() {
        let mut cell = Cell::new(0, 0);
        cell.set_formula("=A1+1");
        match &cell.content {
            CellContent::Formula {
                expression,
                cached_value,
                cached_text,
                is_text_result,
                error,
            } => {
                assert_eq!(expression, "=A1+1");
                assert_eq!(*cached_value, 0.0);
                assert!(cached_text.is_none());
                assert!(!is_text_result);
                assert!(error.is_none());
            }
            other => panic!("Expected formula content, got {:?}", other),
        }
    }
}
