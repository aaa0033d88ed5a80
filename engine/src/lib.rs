//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod cell;
pub mod coord;
pub mod dependency_extractor;
pub mod dependency_graph;
pub mod evaluator;
pub mod number_format;
pub mod sheet;
pub mod style;

// Re-export commonly used types at the crate root
pub use cell::{Cell, CellContent, CellError};
pub use coord::{
    col_to_index, index_to_col, parse_cell_reference, reference_to_string, CellCoord, CellRange,
};
pub use dependency_extractor::extract_dependencies;
pub use dependency_graph::DependencyGraph;
pub use evaluator::{EvalResult, Evaluator, FLOAT_COMPARISON_EPSILON, MAX_RANGE_VALUES};
pub use number_format::{error_display, format_cell_value};
pub use sheet::{
    clipboard_retrieve, clipboard_store, RangeClipboard, RangeSelection, Sheet,
    DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT, MAX_COLUMN_WIDTH, MAX_ROW_HEIGHT, MIN_COLUMN_WIDTH,
    MIN_ROW_HEIGHT,
};
pub use style::{parse_color, Alignment, DataFormat, FormatStyle};
