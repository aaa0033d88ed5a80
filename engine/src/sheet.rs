//! FILENAME: engine/src/sheet.rs
//! PURPOSE: The sheet container: owns the cell grid and all mutation APIs.
//! CONTEXT: This module holds the sparse cell storage, column widths and
//! row heights, the range selection, the range clipboard, and the dirty
//! flag driving recalculation. Structural edits (insert/delete row and
//! column) shift cells and re-stamp their stored positions; formula text
//! is never rewritten by structural edits. Recalculation parses every
//! formula, builds the dependency graph, and evaluates in topological
//! order, marking cycle members with a reference error.

use crate::cell::{Cell, CellContent, CellError};
use crate::coord::CellCoord;
use crate::dependency_extractor::extract_dependencies;
use crate::dependency_graph::DependencyGraph;
use crate::evaluator::{EvalResult, Evaluator};
use crate::number_format::format_cell_value;
use crate::style::{DataFormat, FormatStyle};
use log::{debug, warn};
use once_cell::sync::Lazy;
use parser::ast::Expression;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const DEFAULT_COLUMN_WIDTH: i32 = 10;
pub const MIN_COLUMN_WIDTH: i32 = 1;
pub const MAX_COLUMN_WIDTH: i32 = 50;
pub const DEFAULT_ROW_HEIGHT: i32 = 1;
pub const MIN_ROW_HEIGHT: i32 = 1;
pub const MAX_ROW_HEIGHT: i32 = 10;

/// Process-level single-cell clipboard, shared by every sheet.
static CELL_CLIPBOARD: Lazy<Mutex<Option<Cell>>> = Lazy::new(|| Mutex::new(None));

/// Stores a deep copy of a cell in the shared single-cell clipboard.
pub fn clipboard_store(cell: &Cell) {
    *CELL_CLIPBOARD.lock().unwrap() = Some(cell.clone());
}

/// Returns a copy of the most recently stored clipboard cell.
pub fn clipboard_retrieve() -> Option<Cell> {
    CELL_CLIPBOARD.lock().unwrap().clone()
}

/// The current range selection: two corners and nothing more.
/// Purely descriptive state; normalisation happens on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelection {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl RangeSelection {
    /// Returns (min_row, min_col, max_row, max_col).
    fn normalized(&self) -> (usize, usize, usize, usize) {
        (
            self.start_row.min(self.end_row),
            self.start_col.min(self.end_col),
            self.start_row.max(self.end_row),
            self.start_col.max(self.end_col),
        )
    }
}

/// A detached rectangular block of cell copies captured by `range_copy`.
/// Individual slots may be empty; the dimensions are fixed at copy time.
#[derive(Debug, Clone)]
pub struct RangeClipboard {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<Option<Cell>>>,
}

/// The sheet: a rows x cols grid of cell slots with sparse storage.
/// An absent map entry is an empty slot; cells are created lazily on
/// first write.
#[derive(Debug)]
pub struct Sheet {
    pub rows: usize,
    pub cols: usize,
    pub name: String,

    /// Sparse storage: keys are (row, col) with 0-based indices.
    pub cells: HashMap<CellCoord, Cell>,

    /// Column widths; length always equals `cols`.
    pub col_widths: Vec<i32>,
    /// Row heights; length always equals `rows`.
    pub row_heights: Vec<i32>,

    pub selection: Option<RangeSelection>,
    pub range_clipboard: Option<RangeClipboard>,

    pub needs_recalc: bool,
}

impl Sheet {
    /// Creates a new empty sheet with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Sheet {
            rows,
            cols,
            name: "Sheet1".to_string(),
            cells: HashMap::new(),
            col_widths: vec![DEFAULT_COLUMN_WIDTH; cols],
            row_heights: vec![DEFAULT_ROW_HEIGHT; rows],
            selection: None,
            range_clipboard: None,
            needs_recalc: false,
        }
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    // ========================================================================
    // CELL ACCESS
    // ========================================================================

    /// Returns the cell at (row, col), or None for empty slots and
    /// out-of-bounds coordinates.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Ensures a cell exists at (row, col) and returns it mutably.
    /// Returns None only for out-of-bounds coordinates.
    pub fn get_or_create(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if !self.in_bounds(row, col) {
            return None;
        }
        Some(
            self.cells
                .entry((row, col))
                .or_insert_with(|| Cell::new(row, col)),
        )
    }

    /// Returns the formatted display string for a cell; empty slots and
    /// out-of-bounds coordinates render as "".
    pub fn display(&self, row: usize, col: usize) -> String {
        match self.get(row, col) {
            Some(cell) => format_cell_value(cell),
            None => String::new(),
        }
    }

    // ========================================================================
    // CELL WRITES
    // ========================================================================

    pub fn set_number(&mut self, row: usize, col: usize, value: f64) {
        if let Some(cell) = self.get_or_create(row, col) {
            cell.set_number(value);
            self.needs_recalc = true;
        }
    }

    pub fn set_text(&mut self, row: usize, col: usize, text: impl Into<String>) {
        if let Some(cell) = self.get_or_create(row, col) {
            cell.set_text(text);
            self.needs_recalc = true;
        }
    }

    pub fn set_formula(&mut self, row: usize, col: usize, expression: impl Into<String>) {
        if let Some(cell) = self.get_or_create(row, col) {
            cell.set_formula(expression);
            self.needs_recalc = true;
        }
    }

    /// Clears a cell back to empty. Its format descriptor is retained.
    pub fn clear_cell(&mut self, row: usize, col: usize) {
        if let Some(cell) = self.cells.get_mut(&(row, col)) {
            cell.clear();
            self.needs_recalc = true;
        }
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: DataFormat, style: FormatStyle) {
        if let Some(cell) = self.get_or_create(row, col) {
            cell.format = format;
            cell.format_style = style;
        }
    }

    pub fn set_text_color(&mut self, row: usize, col: usize, color: i32) {
        if let Some(cell) = self.get_or_create(row, col) {
            cell.text_color = color;
        }
    }

    pub fn set_background_color(&mut self, row: usize, col: usize, color: i32) {
        if let Some(cell) = self.get_or_create(row, col) {
            cell.background_color = color;
        }
    }

    /// Copies one cell onto another by kind, including display and
    /// formatting attributes, then recalculates.
    pub fn copy_cell(&mut self, src_row: usize, src_col: usize, dest_row: usize, dest_col: usize) {
        if !self.in_bounds(dest_row, dest_col) {
            return;
        }

        let source = match self.get(src_row, src_col) {
            Some(cell) => cell.clone(),
            None => {
                self.clear_cell(dest_row, dest_col);
                return;
            }
        };

        self.write_cell_copy(dest_row, dest_col, &source);
        self.recalculate();
    }

    /// Writes a detached cell copy to (row, col): content by kind plus
    /// display attributes. Formulas are copied by expression text; their
    /// caches are not trusted and start cold.
    fn write_cell_copy(&mut self, row: usize, col: usize, source: &Cell) {
        match &source.content {
            CellContent::Number(n) => self.set_number(row, col, *n),
            CellContent::Text(s) => self.set_text(row, col, s.clone()),
            CellContent::Formula { expression, .. } => {
                self.set_formula(row, col, expression.clone())
            }
            CellContent::Empty => self.clear_cell(row, col),
        }
        if let Some(cell) = self.get_or_create(row, col) {
            cell.copy_attributes_from(source);
        }
    }

    // ========================================================================
    // RANGE SELECTION & CLIPBOARD
    // ========================================================================

    pub fn selection_start(&mut self, row: usize, col: usize) {
        self.selection = Some(RangeSelection {
            start_row: row,
            start_col: col,
            end_row: row,
            end_col: col,
        });
    }

    pub fn selection_extend(&mut self, row: usize, col: usize) {
        if let Some(selection) = &mut self.selection {
            selection.end_row = row;
            selection.end_col = col;
        }
    }

    pub fn selection_clear(&mut self) {
        self.selection = None;
    }

    pub fn selection_contains(&self, row: usize, col: usize) -> bool {
        match &self.selection {
            Some(selection) => {
                let (min_row, min_col, max_row, max_col) = selection.normalized();
                row >= min_row && row <= max_row && col >= min_col && col <= max_col
            }
            None => false,
        }
    }

    /// Captures a deep copy of the selected rectangle into the range
    /// clipboard, replacing any previous block. No-op without a selection.
    pub fn range_copy(&mut self) {
        let Some(selection) = self.selection else {
            return;
        };
        let (min_row, min_col, max_row, max_col) = selection.normalized();

        let rows = max_row - min_row + 1;
        let cols = max_col - min_col + 1;
        let mut block = Vec::with_capacity(rows);
        for i in 0..rows {
            let mut block_row = Vec::with_capacity(cols);
            for j in 0..cols {
                block_row.push(self.get(min_row + i, min_col + j).cloned());
            }
            block.push(block_row);
        }

        self.range_clipboard = Some(RangeClipboard {
            rows,
            cols,
            cells: block,
        });
    }

    /// Pastes the clipboard block with its top-left at (start_row,
    /// start_col), clipping silently at the sheet bounds. Empty block
    /// slots clear their destinations. Recalculates afterwards.
    pub fn range_paste(&mut self, start_row: usize, start_col: usize) {
        let Some(block) = self.range_clipboard.clone() else {
            return;
        };

        for i in 0..block.rows {
            for j in 0..block.cols {
                let dest_row = start_row + i;
                let dest_col = start_col + j;
                if !self.in_bounds(dest_row, dest_col) {
                    continue;
                }
                match &block.cells[i][j] {
                    Some(source) => self.write_cell_copy(dest_row, dest_col, source),
                    None => self.clear_cell(dest_row, dest_col),
                }
            }
        }

        self.recalculate();
    }

    // ========================================================================
    // SIZING
    // ========================================================================

    pub fn set_col_width(&mut self, col: usize, width: i32) {
        if col < self.cols {
            self.col_widths[col] = width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        }
    }

    pub fn set_row_height(&mut self, row: usize, height: i32) {
        if row < self.rows {
            self.row_heights[row] = height.clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT);
        }
    }

    pub fn get_col_width(&self, col: usize) -> i32 {
        self.col_widths.get(col).copied().unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn get_row_height(&self, row: usize) -> i32 {
        self.row_heights.get(row).copied().unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    pub fn resize_cols_in_range(&mut self, start_col: usize, end_col: usize, delta: i32) {
        if start_col > end_col || end_col >= self.cols {
            return;
        }
        for col in start_col..=end_col {
            let width = self.col_widths[col] + delta;
            self.col_widths[col] = width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        }
    }

    pub fn resize_rows_in_range(&mut self, start_row: usize, end_row: usize, delta: i32) {
        if start_row > end_row || end_row >= self.rows {
            return;
        }
        for row in start_row..=end_row {
            let height = self.row_heights[row] + delta;
            self.row_heights[row] = height.clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT);
        }
    }

    // ========================================================================
    // STRUCTURAL EDITS
    // ========================================================================
    //
    // Cell references inside formulas are textual and are NOT rewritten
    // by these operations: a formula that read A5 still reads the address
    // A5 after a shift, whatever now lives there.

    /// Inserts an empty row at `row`, shifting later rows down by one.
    /// Cells shifted past the last row are dropped.
    pub fn insert_row(&mut self, row: usize) {
        if row >= self.rows {
            return;
        }

        let old = std::mem::take(&mut self.cells);
        for ((r, c), mut cell) in old {
            if r < row {
                self.cells.insert((r, c), cell);
            } else if r + 1 < self.rows {
                cell.row = r + 1;
                self.cells.insert((r + 1, c), cell);
            }
            // Cells evicted off the bottom edge are dropped here
        }

        self.row_heights.insert(row, DEFAULT_ROW_HEIGHT);
        self.row_heights.truncate(self.rows);
        self.needs_recalc = true;
    }

    /// Deletes row `row`, freeing its cells and shifting later rows up.
    /// The vacated last row gets the default height.
    pub fn delete_row(&mut self, row: usize) {
        if row >= self.rows {
            return;
        }

        let old = std::mem::take(&mut self.cells);
        for ((r, c), mut cell) in old {
            if r < row {
                self.cells.insert((r, c), cell);
            } else if r > row {
                cell.row = r - 1;
                self.cells.insert((r - 1, c), cell);
            }
        }

        self.row_heights.remove(row);
        self.row_heights.push(DEFAULT_ROW_HEIGHT);
        self.needs_recalc = true;
    }

    /// Inserts an empty column at `col`, shifting later columns right.
    pub fn insert_column(&mut self, col: usize) {
        if col >= self.cols {
            return;
        }

        let old = std::mem::take(&mut self.cells);
        for ((r, c), mut cell) in old {
            if c < col {
                self.cells.insert((r, c), cell);
            } else if c + 1 < self.cols {
                cell.col = c + 1;
                self.cells.insert((r, c + 1), cell);
            }
        }

        self.col_widths.insert(col, DEFAULT_COLUMN_WIDTH);
        self.col_widths.truncate(self.cols);
        self.needs_recalc = true;
    }

    /// Deletes column `col`, freeing its cells and shifting later columns
    /// left. The vacated last column gets the default width.
    pub fn delete_column(&mut self, col: usize) {
        if col >= self.cols {
            return;
        }

        let old = std::mem::take(&mut self.cells);
        for ((r, c), mut cell) in old {
            if c < col {
                self.cells.insert((r, c), cell);
            } else if c > col {
                cell.col = c - 1;
                self.cells.insert((r, c - 1), cell);
            }
        }

        self.col_widths.remove(col);
        self.col_widths.push(DEFAULT_COLUMN_WIDTH);
        self.needs_recalc = true;
    }

    // ========================================================================
    // RECALCULATION
    // ========================================================================

    /// Re-evaluates every formula cell against the current inputs.
    /// Idempotent: a no-op unless something changed since the last call.
    ///
    /// Formulas are parsed, their precedents extracted into a dependency
    /// graph, and evaluation runs in topological order so every cell sees
    /// fresh inputs. Members of a reference cycle (and cells stuck behind
    /// one) are marked with a Ref error and skipped.
    pub fn recalculate(&mut self) {
        if !self.needs_recalc {
            return;
        }

        let mut parsed: HashMap<CellCoord, Expression> = HashMap::new();
        let mut failed: Vec<CellCoord> = Vec::new();

        for (&coord, cell) in &self.cells {
            if let CellContent::Formula { expression, .. } = &cell.content {
                match parser::parse(expression) {
                    Ok(ast) => {
                        parsed.insert(coord, ast);
                    }
                    Err(_) => failed.push(coord),
                }
            }
        }

        for coord in failed {
            self.store_result(coord, EvalResult::Error(CellError::Parse));
        }

        let mut graph = DependencyGraph::new();
        for (&coord, ast) in &parsed {
            graph.set_dependencies(coord, extract_dependencies(ast, self.rows, self.cols));
        }

        let formula_cells: HashSet<CellCoord> = parsed.keys().copied().collect();
        let (ordered, cyclic) = graph.evaluation_order(&formula_cells);

        if !cyclic.is_empty() {
            warn!("reference cycle involving {} cell(s)", cyclic.len());
        }
        for coord in cyclic {
            self.store_result(coord, EvalResult::Error(CellError::Ref));
        }

        debug!("recalculating {} formula cell(s)", ordered.len());
        for coord in ordered {
            let result = Evaluator::new(self).evaluate(&parsed[&coord]);
            self.store_result(coord, result);
        }

        self.needs_recalc = false;
    }

    /// Stores an evaluation outcome into a formula cell's cached slots.
    /// On error the stale scalar is left in place but unreadable (the
    /// error gates every access); the text cache is always cleared first.
    fn store_result(&mut self, coord: CellCoord, result: EvalResult) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            if let CellContent::Formula {
                cached_value,
                cached_text,
                is_text_result,
                error,
                ..
            } = &mut cell.content
            {
                match result {
                    EvalResult::Number(n) => {
                        *cached_value = n;
                        *cached_text = None;
                        *is_text_result = false;
                        *error = None;
                    }
                    EvalResult::Text(text) => {
                        *cached_value = 0.0;
                        *cached_text = Some(text);
                        *is_text_result = true;
                        *error = None;
                    }
                    EvalResult::Error(e) => {
                        *cached_text = None;
                        *is_text_result = false;
                        *error = Some(e);
                    }
                }
            }
        }
    }

    /// The smallest (max_row, max_col) covering every non-empty cell,
    /// or None when the sheet is entirely empty.
    pub fn used_extent(&self) -> Option<(usize, usize)> {
        let mut extent: Option<(usize, usize)> = None;
        for (&(row, col), cell) in &self.cells {
            if cell.is_empty() {
                continue;
            }
            extent = Some(match extent {
                None => (row, col),
                Some((max_row, max_col)) => (max_row.max(row), max_col.max(col)),
            });
        }
        extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_cell_creation() {
        let mut sheet = Sheet::new(10, 10);
        assert!(sheet.get(0, 0).is_none());
        sheet.set_number(0, 0, 1.0);
        assert!(sheet.get(0, 0).is_some());
        assert!(sheet.needs_recalc);
    }

    #[test]
    fn writes_out_of_bounds_are_ignored() {
        let mut sheet = Sheet::new(5, 5);
        sheet.set_number(7, 7, 1.0);
        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.display(7, 7), "");
    }

    #[test]
    fn clear_keeps_format_and_marks_dirty() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(1, 1, 3.0);
        sheet.set_format(1, 1, DataFormat::Currency, FormatStyle::default());
        sheet.recalculate();

        sheet.clear_cell(1, 1);
        assert!(sheet.needs_recalc);
        let cell = sheet.get(1, 1).unwrap();
        assert!(cell.is_empty());
        assert_eq!(cell.format, DataFormat::Currency);
    }

    #[test]
    fn recalculation_chain_propagates() {
        let mut sheet = Sheet::new(20, 5);
        sheet.set_number(0, 0, 1.0);
        for row in 1..=10 {
            sheet.set_formula(row, 0, format!("=A{}*2", row));
        }
        sheet.recalculate();
        assert_eq!(sheet.display(10, 0), "1024");

        sheet.set_number(0, 0, 5.0);
        sheet.recalculate();
        assert_eq!(sheet.display(10, 0), "5120");
    }

    #[test]
    fn chain_evaluates_regardless_of_insertion_order() {
        // The dependency order is the reverse of the cell order: A1 = A2*2,
        // A2 = A3*2, A3 = 10. A naive row-major sweep would read stale zeros.
        let mut sheet = Sheet::new(10, 10);
        sheet.set_formula(0, 0, "=A2*2");
        sheet.set_formula(1, 0, "=A3*2");
        sheet.set_number(2, 0, 10.0);
        sheet.recalculate();
        assert_eq!(sheet.display(0, 0), "40");
    }

    #[test]
    fn recalculate_is_idempotent() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 2.0);
        sheet.set_formula(1, 0, "=A1*3");
        sheet.recalculate();
        assert!(!sheet.needs_recalc);

        let before = sheet.display(1, 0);
        sheet.recalculate();
        sheet.recalculate();
        assert_eq!(sheet.display(1, 0), before);
    }

    #[test]
    fn cycles_get_ref_errors() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_formula(0, 0, "=A2");
        sheet.set_formula(1, 0, "=A1");
        sheet.recalculate();
        assert_eq!(sheet.display(0, 0), "#REF!");
        assert_eq!(sheet.display(1, 0), "#REF!");
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_formula(0, 0, "=A1+1");
        sheet.recalculate();
        assert_eq!(sheet.display(0, 0), "#REF!");
    }

    #[test]
    fn malformed_formula_gets_parse_error() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_formula(0, 0, "=1+");
        sheet.recalculate();
        assert_eq!(sheet.display(0, 0), "#PARSE!");
    }

    #[test]
    fn error_recovers_after_fixing_input() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 0.0);
        sheet.set_formula(1, 0, "=1/A1");
        sheet.recalculate();
        assert_eq!(sheet.display(1, 0), "#DIV/0!");

        sheet.set_number(0, 0, 4.0);
        sheet.recalculate();
        assert_eq!(sheet.display(1, 0), "0.25");
    }

    #[test]
    fn positions_are_restamped_after_structural_edits() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(3, 2, 1.0);
        sheet.set_number(5, 4, 2.0);

        sheet.insert_row(2);
        sheet.delete_column(0);

        for (&(row, col), cell) in &sheet.cells {
            assert_eq!(cell.row, row);
            assert_eq!(cell.col, col);
        }
    }

    #[test]
    fn insert_row_shifts_down_and_drops_last() {
        let mut sheet = Sheet::new(3, 3);
        sheet.set_number(0, 0, 1.0);
        sheet.set_number(1, 0, 2.0);
        sheet.set_number(2, 0, 3.0);

        sheet.insert_row(1);

        assert!(sheet.get(1, 0).is_none());
        assert_eq!(sheet.get(0, 0).unwrap().content, CellContent::Number(1.0));
        assert_eq!(sheet.get(2, 0).unwrap().content, CellContent::Number(2.0));
        // The 3.0 fell off the bottom edge
        assert_eq!(sheet.cells.len(), 2);
        assert_eq!(sheet.row_heights.len(), 3);
    }

    #[test]
    fn delete_row_shifts_up() {
        let mut sheet = Sheet::new(3, 3);
        sheet.set_number(0, 0, 1.0);
        sheet.set_number(1, 0, 2.0);
        sheet.set_number(2, 0, 3.0);
        sheet.set_row_height(2, 5);

        sheet.delete_row(0);

        assert_eq!(sheet.get(0, 0).unwrap().content, CellContent::Number(2.0));
        assert_eq!(sheet.get(1, 0).unwrap().content, CellContent::Number(3.0));
        assert!(sheet.get(2, 0).is_none());
        // Heights shifted in parallel; the vacated last row is default
        assert_eq!(sheet.row_heights, vec![DEFAULT_ROW_HEIGHT, 5, DEFAULT_ROW_HEIGHT]);
    }

    #[test]
    fn insert_and_delete_column_shift_widths() {
        let mut sheet = Sheet::new(3, 3);
        sheet.set_col_width(0, 20);
        sheet.set_col_width(1, 30);

        sheet.insert_column(0);
        assert_eq!(sheet.col_widths, vec![DEFAULT_COLUMN_WIDTH, 20, 30]);

        sheet.delete_column(0);
        assert_eq!(sheet.col_widths, vec![20, 30, DEFAULT_COLUMN_WIDTH]);
    }

    #[test]
    fn structural_edits_do_not_rewrite_references() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 1.0);
        sheet.set_number(1, 0, 2.0);
        sheet.set_formula(0, 1, "=A2");
        sheet.recalculate();
        assert_eq!(sheet.display(0, 1), "2");

        // Shifting row 2 down leaves B1's text pointing at the now-empty A2
        sheet.insert_row(1);
        sheet.recalculate();
        assert_eq!(sheet.display(0, 1), "0");
        assert_eq!(sheet.get(2, 0).unwrap().content, CellContent::Number(2.0));
    }

    #[test]
    fn widths_and_heights_stay_clamped() {
        let mut sheet = Sheet::new(5, 5);
        sheet.set_col_width(0, 500);
        assert_eq!(sheet.get_col_width(0), MAX_COLUMN_WIDTH);
        sheet.set_col_width(0, 0);
        assert_eq!(sheet.get_col_width(0), MIN_COLUMN_WIDTH);

        sheet.set_row_height(0, 100);
        assert_eq!(sheet.get_row_height(0), MAX_ROW_HEIGHT);

        sheet.resize_cols_in_range(0, 4, 100);
        sheet.resize_rows_in_range(0, 4, -100);
        for col in 0..5 {
            assert!((MIN_COLUMN_WIDTH..=MAX_COLUMN_WIDTH).contains(&sheet.get_col_width(col)));
        }
        for row in 0..5 {
            assert!((MIN_ROW_HEIGHT..=MAX_ROW_HEIGHT).contains(&sheet.get_row_height(row)));
        }
    }

    #[test]
    fn selection_contains_normalises_corners() {
        let mut sheet = Sheet::new(10, 10);
        sheet.selection_start(5, 5);
        sheet.selection_extend(2, 2);
        assert!(sheet.selection_contains(3, 3));
        assert!(sheet.selection_contains(5, 5));
        assert!(!sheet.selection_contains(6, 3));

        sheet.selection_clear();
        assert!(!sheet.selection_contains(3, 3));
    }

    #[test]
    fn range_copy_paste_preserves_kinds_and_formats() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 1.0);
        sheet.set_text(0, 1, "label");
        sheet.set_formula(1, 0, "=A1*10");
        sheet.set_format(0, 0, DataFormat::Currency, FormatStyle::default());
        sheet.recalculate();

        sheet.selection_start(0, 0);
        sheet.selection_extend(1, 1);
        sheet.range_copy();
        sheet.range_paste(5, 5);

        assert_eq!(sheet.get(5, 5).unwrap().content, CellContent::Number(1.0));
        assert_eq!(sheet.get(5, 5).unwrap().format, DataFormat::Currency);
        assert_eq!(
            sheet.get(5, 6).unwrap().content,
            CellContent::Text("label".to_string())
        );
        // Formula travels by expression text and still reads A1
        assert_eq!(
            sheet.get(6, 5).unwrap().formula_expression(),
            Some("=A1*10")
        );
        assert_eq!(sheet.display(6, 5), "10");
    }

    #[test]
    fn range_paste_clips_at_bounds() {
        let mut sheet = Sheet::new(4, 4);
        sheet.set_number(0, 0, 1.0);
        sheet.set_number(1, 1, 2.0);
        sheet.selection_start(0, 0);
        sheet.selection_extend(1, 1);
        sheet.range_copy();

        // Bottom-right corner: only the top-left block cell fits
        sheet.range_paste(3, 3);
        assert_eq!(sheet.get(3, 3).unwrap().content, CellContent::Number(1.0));
    }

    #[test]
    fn empty_block_slot_clears_destination() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 1.0);
        // (0,1) left empty in the copied block
        sheet.set_number(5, 6, 99.0);
        sheet.selection_start(0, 0);
        sheet.selection_extend(0, 1);
        sheet.range_copy();

        sheet.range_paste(5, 5);
        assert!(sheet.get(5, 6).unwrap().is_empty());
    }

    #[test]
    fn single_cell_clipboard_roundtrip() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(2, 3, 7.5);
        sheet.set_text_color(2, 3, 4);
        clipboard_store(sheet.get(2, 3).unwrap());

        let copied = clipboard_retrieve().unwrap();
        assert_eq!(copied.content, CellContent::Number(7.5));
        assert_eq!(copied.text_color, 4);
        assert_eq!((copied.row, copied.col), (2, 3));
    }

    #[test]
    fn copy_cell_from_empty_clears_destination() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(1, 1, 5.0);
        sheet.copy_cell(0, 0, 1, 1);
        assert!(sheet.get(1, 1).unwrap().is_empty());
    }

    #[test]
    fn used_extent_tracks_nonempty_cells() {
        let mut sheet = Sheet::new(10, 10);
        assert_eq!(sheet.used_extent(), None);
        sheet.set_number(2, 1, 1.0);
        sheet.set_text(0, 4, "x");
        assert_eq!(sheet.used_extent(), Some((2, 4)));

        sheet.clear_cell(2, 1);
        assert_eq!(sheet.used_extent(), Some((0, 4)));
    }
}
