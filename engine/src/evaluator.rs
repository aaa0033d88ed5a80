//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Evaluates AST expressions to compute cell values.
//! CONTEXT: After a formula is parsed into an AST, this module traverses
//! the tree and computes the final result. It handles cell lookups,
//! arithmetic, comparison overloading (string vs number), bare-range
//! collapse, and the built-in spreadsheet functions.
//!
//! The evaluator never mutates the sheet: it returns an `EvalResult` and
//! the recalculation driver stores the outcome on the formula cell.
//!
//! SUPPORTED FUNCTIONS: SUM, AVG, MAX, MIN, MEDIAN, MODE, POWER, IF, XLOOKUP

use crate::cell::{CellContent, CellError};
use crate::coord::{col_to_index, CellCoord, CellRange};
use crate::sheet::Sheet;
use parser::ast::{BinaryOperator, BuiltinFunction, Expression, UnaryOperator, Value};

/// A single range evaluation collects at most this many contributions;
/// further elements are silently ignored.
pub const MAX_RANGE_VALUES: usize = 1000;

/// Absolute epsilon for numeric equality in comparisons, MODE grouping,
/// and exact-match XLOOKUP.
pub const FLOAT_COMPARISON_EPSILON: f64 = 1e-10;

/// The result of evaluating an expression. A formula produces either a
/// number, a piece of text (string IF branches, text XLOOKUP hits), or an
/// error that the recalculation driver stores on the cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Number(f64),
    Text(String),
    Error(CellError),
}

impl EvalResult {
    pub fn is_error(&self) -> bool {
        matches!(self, EvalResult::Error(_))
    }
}

/// The formula evaluator. Holds a reference to the sheet for cell lookups.
pub struct Evaluator<'a> {
    sheet: &'a Sheet,
}

impl<'a> Evaluator<'a> {
    /// Creates a new Evaluator with a reference to the sheet.
    pub fn new(sheet: &'a Sheet) -> Self {
        Evaluator { sheet }
    }

    /// Evaluates an AST expression and returns the result.
    pub fn evaluate(&self, expr: &Expression) -> EvalResult {
        match expr {
            Expression::Literal(Value::Number(n)) => EvalResult::Number(*n),
            Expression::Literal(Value::String(s)) => EvalResult::Text(s.clone()),
            Expression::CellRef { col, row } => match self.resolve_coord(col, *row) {
                Ok(coord) => self.cell_value_at(coord),
                Err(e) => EvalResult::Error(e),
            },
            // A bare range used as a factor collapses to the sum of its contents
            Expression::Range { .. } => match self.range_from_expr(expr) {
                Ok(range) => match self.range_values(&range) {
                    Ok(values) => EvalResult::Number(values.iter().sum()),
                    Err(e) => EvalResult::Error(e),
                },
                Err(e) => EvalResult::Error(e),
            },
            Expression::BinaryOp { left, op, right } => self.eval_binary_op(left, *op, right),
            Expression::UnaryOp { op, operand } => self.eval_unary_op(*op, operand),
            Expression::FunctionCall { func, args } => self.eval_function(*func, args),
        }
    }

    /// Resolves a textual (column, 1-based row) reference to a 0-based
    /// coordinate, rejecting anything outside the sheet's dimensions.
    fn resolve_coord(&self, col: &str, row: u32) -> Result<CellCoord, CellError> {
        let col_idx = col_to_index(col).ok_or(CellError::Ref)?;
        let row_idx = row as usize - 1;
        if row_idx >= self.sheet.rows || col_idx >= self.sheet.cols {
            return Err(CellError::Ref);
        }
        Ok((row_idx, col_idx))
    }

    /// Looks up the value a reference to `coord` yields.
    /// Empty or absent cells read as 0.0; formula cells expose their
    /// cached result, or their error if the last evaluation failed.
    fn cell_value_at(&self, coord: CellCoord) -> EvalResult {
        match self.sheet.get(coord.0, coord.1) {
            None => EvalResult::Number(0.0),
            Some(cell) => match &cell.content {
                CellContent::Empty => EvalResult::Number(0.0),
                CellContent::Number(n) => EvalResult::Number(*n),
                CellContent::Text(s) => EvalResult::Text(s.clone()),
                CellContent::Formula { error: Some(e), .. } => EvalResult::Error(*e),
                CellContent::Formula {
                    is_text_result: true,
                    cached_text: Some(text),
                    ..
                } => EvalResult::Text(text.clone()),
                CellContent::Formula { cached_value, .. } => EvalResult::Number(*cached_value),
            },
        }
    }

    /// Evaluates an expression in a numeric context.
    /// Text is a Value error here; text only flows through comparisons,
    /// IF branches and XLOOKUP.
    fn numeric_value(&self, expr: &Expression) -> Result<f64, CellError> {
        match self.evaluate(expr) {
            EvalResult::Number(n) => Ok(n),
            EvalResult::Text(_) => Err(CellError::Value),
            EvalResult::Error(e) => Err(e),
        }
    }

    /// Extracts a bounds-checked CellRange from a Range AST node.
    fn range_from_expr(&self, expr: &Expression) -> Result<CellRange, CellError> {
        if let Expression::Range { start, end } = expr {
            let start_coord = match start.as_ref() {
                Expression::CellRef { col, row } => self.resolve_coord(col, *row)?,
                _ => return Err(CellError::Ref),
            };
            let end_coord = match end.as_ref() {
                Expression::CellRef { col, row } => self.resolve_coord(col, *row)?,
                _ => return Err(CellError::Ref),
            };
            Ok(CellRange::new(start_coord, end_coord))
        } else {
            Err(CellError::Ref)
        }
    }

    /// Collects the numeric contributions of a range, capped at
    /// MAX_RANGE_VALUES. Empty slots contribute 0.0, text cells are
    /// skipped silently, and errored formula cells propagate their error.
    fn range_values(&self, range: &CellRange) -> Result<Vec<f64>, CellError> {
        let mut values = Vec::new();

        for (row, col) in range.coords() {
            if values.len() >= MAX_RANGE_VALUES {
                break;
            }
            match self.sheet.get(row, col) {
                None => values.push(0.0),
                Some(cell) => match &cell.content {
                    CellContent::Empty => values.push(0.0),
                    CellContent::Number(n) => values.push(*n),
                    CellContent::Text(_) => {}
                    CellContent::Formula { error: Some(e), .. } => return Err(*e),
                    CellContent::Formula {
                        is_text_result: true,
                        ..
                    } => {}
                    CellContent::Formula { cached_value, .. } => values.push(*cached_value),
                },
            }
        }

        Ok(values)
    }

    fn eval_binary_op(
        &self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
    ) -> EvalResult {
        if op.is_comparison() {
            return self.eval_comparison(left, op, right);
        }

        let lhs = match self.numeric_value(left) {
            Ok(n) => n,
            Err(e) => return EvalResult::Error(e),
        };
        let rhs = match self.numeric_value(right) {
            Ok(n) => n,
            Err(e) => return EvalResult::Error(e),
        };

        match op {
            BinaryOperator::Add => EvalResult::Number(lhs + rhs),
            BinaryOperator::Subtract => EvalResult::Number(lhs - rhs),
            BinaryOperator::Multiply => EvalResult::Number(lhs * rhs),
            BinaryOperator::Divide => {
                if rhs == 0.0 {
                    EvalResult::Error(CellError::DivZero)
                } else {
                    EvalResult::Number(lhs / rhs)
                }
            }
            // is_comparison() handled above
            _ => EvalResult::Error(CellError::Parse),
        }
    }

    /// Comparison with string/number overloading.
    ///
    /// When either side produces text (a string literal or a reference to
    /// a text cell), both sides are compared as strings: a numeric or
    /// empty side reads as "". Otherwise both sides compare numerically,
    /// with = and <> using the comparison epsilon. The result is 1.0/0.0.
    fn eval_comparison(
        &self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
    ) -> EvalResult {
        let lhs = self.evaluate(left);
        if let EvalResult::Error(e) = lhs {
            return EvalResult::Error(e);
        }
        let rhs = self.evaluate(right);
        if let EvalResult::Error(e) = rhs {
            return EvalResult::Error(e);
        }

        let outcome = match (&lhs, &rhs) {
            (EvalResult::Text(_), _) | (_, EvalResult::Text(_)) => {
                let l = comparison_text(&lhs);
                let r = comparison_text(&rhs);
                match op {
                    BinaryOperator::Equal => l == r,
                    BinaryOperator::NotEqual => l != r,
                    BinaryOperator::LessThan => l < r,
                    BinaryOperator::LessEqual => l <= r,
                    BinaryOperator::GreaterThan => l > r,
                    BinaryOperator::GreaterEqual => l >= r,
                    _ => unreachable!(),
                }
            }
            (EvalResult::Number(l), EvalResult::Number(r)) => match op {
                BinaryOperator::Equal => (l - r).abs() < FLOAT_COMPARISON_EPSILON,
                BinaryOperator::NotEqual => (l - r).abs() >= FLOAT_COMPARISON_EPSILON,
                BinaryOperator::LessThan => l < r,
                BinaryOperator::LessEqual => l <= r,
                BinaryOperator::GreaterThan => l > r,
                BinaryOperator::GreaterEqual => l >= r,
                _ => unreachable!(),
            },
            _ => return EvalResult::Error(CellError::Value),
        };

        EvalResult::Number(if outcome { 1.0 } else { 0.0 })
    }

    fn eval_unary_op(&self, op: UnaryOperator, operand: &Expression) -> EvalResult {
        match op {
            UnaryOperator::Negate => match self.numeric_value(operand) {
                Ok(n) => EvalResult::Number(-n),
                Err(e) => EvalResult::Error(e),
            },
        }
    }

    /// Evaluates a function call via enum dispatch.
    fn eval_function(&self, func: BuiltinFunction, args: &[Expression]) -> EvalResult {
        match func {
            BuiltinFunction::Sum => self.fn_aggregate(args, |values| values.iter().sum()),
            BuiltinFunction::Avg => self.fn_aggregate(args, |values| {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }),
            BuiltinFunction::Max => self.fn_aggregate(args, |values| {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
                }
            }),
            BuiltinFunction::Min => self.fn_aggregate(args, |values| {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().cloned().fold(f64::INFINITY, f64::min)
                }
            }),
            BuiltinFunction::Median => self.fn_median(args),
            BuiltinFunction::Mode => self.fn_mode(args),
            BuiltinFunction::Power => self.fn_power(args),
            BuiltinFunction::If => self.fn_if(args),
            BuiltinFunction::XLookup => self.fn_xlookup(args),
        }
    }

    /// Collects the values an aggregate function operates on: a range's
    /// contributions, a single cell's value, or any numeric expression.
    fn aggregate_values(&self, arg: &Expression) -> Result<Vec<f64>, CellError> {
        match arg {
            Expression::Range { .. } => {
                let range = self.range_from_expr(arg)?;
                self.range_values(&range)
            }
            Expression::CellRef { col, row } => {
                let coord = self.resolve_coord(col, *row)?;
                match self.cell_value_at(coord) {
                    EvalResult::Number(n) => Ok(vec![n]),
                    EvalResult::Text(_) => Err(CellError::Value),
                    EvalResult::Error(e) => Err(e),
                }
            }
            other => Ok(vec![self.numeric_value(other)?]),
        }
    }

    fn fn_aggregate(&self, args: &[Expression], fold: impl Fn(&[f64]) -> f64) -> EvalResult {
        if args.len() != 1 {
            return EvalResult::Error(CellError::Value);
        }
        match self.aggregate_values(&args[0]) {
            Ok(values) => EvalResult::Number(fold(&values)),
            Err(e) => EvalResult::Error(e),
        }
    }

    fn fn_median(&self, args: &[Expression]) -> EvalResult {
        if args.len() != 1 {
            return EvalResult::Error(CellError::Value);
        }
        let mut values = match self.aggregate_values(&args[0]) {
            Ok(values) => values,
            Err(e) => return EvalResult::Error(e),
        };
        if values.is_empty() {
            return EvalResult::Number(0.0);
        }

        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };
        EvalResult::Number(median)
    }

    /// Most frequent value; ties broken by first occurrence. Values within
    /// the comparison epsilon count as equal.
    fn fn_mode(&self, args: &[Expression]) -> EvalResult {
        if args.len() != 1 {
            return EvalResult::Error(CellError::Value);
        }
        let values = match self.aggregate_values(&args[0]) {
            Ok(values) => values,
            Err(e) => return EvalResult::Error(e),
        };
        if values.is_empty() {
            return EvalResult::Number(0.0);
        }

        let mut mode = values[0];
        let mut best_count = 0usize;
        for (i, &candidate) in values.iter().enumerate() {
            let count = values[i..]
                .iter()
                .filter(|&&v| (v - candidate).abs() < FLOAT_COMPARISON_EPSILON)
                .count();
            if count > best_count {
                best_count = count;
                mode = candidate;
            }
        }
        EvalResult::Number(mode)
    }

    fn fn_power(&self, args: &[Expression]) -> EvalResult {
        if args.len() != 2 {
            return EvalResult::Error(CellError::Value);
        }
        let base = match self.numeric_value(&args[0]) {
            Ok(n) => n,
            Err(e) => return EvalResult::Error(e),
        };
        let exponent = match self.numeric_value(&args[1]) {
            Ok(n) => n,
            Err(e) => return EvalResult::Error(e),
        };
        EvalResult::Number(base.powf(exponent))
    }

    /// IF(condition, true_value, false_value). A non-zero condition picks
    /// the first branch. Branches may be string literals; the chosen
    /// branch's text becomes the formula's text result.
    fn fn_if(&self, args: &[Expression]) -> EvalResult {
        if args.len() != 3 {
            return EvalResult::Error(CellError::Value);
        }
        let condition = match self.numeric_value(&args[0]) {
            Ok(n) => n,
            Err(e) => return EvalResult::Error(e),
        };
        if condition != 0.0 {
            self.evaluate(&args[1])
        } else {
            self.evaluate(&args[2])
        }
    }

    /// XLOOKUP(key, lookup_range, return_range, [mode]).
    /// mode 0 (default) = exact match, non-zero = approximate (largest
    /// value <= key). Searches vertically when the lookup range spans more
    /// than one row, horizontally otherwise.
    fn fn_xlookup(&self, args: &[Expression]) -> EvalResult {
        if args.len() < 3 || args.len() > 4 {
            return EvalResult::Error(CellError::Value);
        }

        let key = self.evaluate(&args[0]);
        if let EvalResult::Error(e) = key {
            return EvalResult::Error(e);
        }

        let lookup = match self.range_from_expr(&args[1]) {
            Ok(range) => range,
            Err(e) => return EvalResult::Error(e),
        };
        let ret = match self.range_from_expr(&args[2]) {
            Ok(range) => range,
            Err(e) => return EvalResult::Error(e),
        };

        // Parallel ranges must have identical dimensions
        if lookup.rows() != ret.rows() || lookup.cols() != ret.cols() {
            return EvalResult::Error(CellError::Ref);
        }

        let exact = match args.get(3) {
            None => true,
            Some(mode_expr) => match self.numeric_value(mode_expr) {
                Ok(mode) => mode == 0.0,
                Err(e) => return EvalResult::Error(e),
            },
        };

        let vertical = lookup.rows() > 1;
        let count = if vertical { lookup.rows() } else { lookup.cols() };
        let element = |range: &CellRange, i: usize| -> CellCoord {
            if vertical {
                (range.start_row + i, range.start_col)
            } else {
                (range.start_row, range.start_col + i)
            }
        };

        let mut matched: Option<usize> = None;

        match &key {
            EvalResult::Text(key_text) => {
                // Text keys always match exactly
                for i in 0..count {
                    if let EvalResult::Text(candidate) = self.cell_value_at(element(&lookup, i)) {
                        if candidate == *key_text {
                            matched = Some(i);
                            break;
                        }
                    }
                }
            }
            EvalResult::Number(key_value) => {
                let mut best: Option<(usize, f64)> = None;
                for i in 0..count {
                    let coord = element(&lookup, i);
                    let candidate = match self.sheet.get(coord.0, coord.1) {
                        Some(cell) => match &cell.content {
                            CellContent::Number(n) => *n,
                            CellContent::Formula {
                                error: None,
                                is_text_result: false,
                                cached_value,
                                ..
                            } => *cached_value,
                            _ => continue,
                        },
                        None => continue,
                    };
                    if exact {
                        if (candidate - key_value).abs() < FLOAT_COMPARISON_EPSILON {
                            matched = Some(i);
                            break;
                        }
                    } else if candidate <= *key_value {
                        // Approximate: keep the largest candidate <= key
                        if best.map_or(true, |(_, value)| candidate > value) {
                            best = Some((i, candidate));
                        }
                    }
                }
                if matched.is_none() {
                    matched = best.map(|(i, _)| i);
                }
            }
            EvalResult::Error(_) => unreachable!(),
        }

        match matched {
            Some(i) => self.cell_value_at(element(&ret, i)),
            None => EvalResult::Error(CellError::Na),
        }
    }
}

/// The text a value contributes to a string comparison: text reads as
/// itself, numbers and empties read as the empty string.
fn comparison_text(result: &EvalResult) -> &str {
    match result {
        EvalResult::Text(s) => s,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Sheet;
    use parser::parse;

    fn eval(sheet: &Sheet, formula: &str) -> EvalResult {
        let expr = parse(formula).expect("formula should parse");
        Evaluator::new(sheet).evaluate(&expr)
    }

    fn assert_number(result: EvalResult, expected: f64) {
        match result {
            EvalResult::Number(n) => assert!(
                (n - expected).abs() < 1e-9,
                "expected {}, got {}",
                expected,
                n
            ),
            other => panic!("expected number {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn evaluates_arithmetic_with_precedence() {
        let sheet = Sheet::new(10, 10);
        assert_number(eval(&sheet, "=1+2*3"), 7.0);
        assert_number(eval(&sheet, "=(1+2)*3"), 9.0);
        assert_number(eval(&sheet, "=10-4/2"), 8.0);
        assert_number(eval(&sheet, "=-5+3"), -2.0);
    }

    #[test]
    fn division_by_zero_errors() {
        let sheet = Sheet::new(10, 10);
        assert_eq!(eval(&sheet, "=1/0"), EvalResult::Error(CellError::DivZero));
        // The error short-circuits the enclosing expression
        assert_eq!(
            eval(&sheet, "=5+1/0"),
            EvalResult::Error(CellError::DivZero)
        );
    }

    #[test]
    fn cell_references_read_the_sheet() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 42.0);
        assert_number(eval(&sheet, "=A1"), 42.0);
        assert_number(eval(&sheet, "=A1*2"), 84.0);
        // Empty cells read as zero
        assert_number(eval(&sheet, "=B5"), 0.0);
    }

    #[test]
    fn out_of_bounds_reference_is_ref_error() {
        let sheet = Sheet::new(5, 5);
        assert_eq!(eval(&sheet, "=Z99"), EvalResult::Error(CellError::Ref));
        assert_eq!(
            eval(&sheet, "=SUM(A1:Z99)"),
            EvalResult::Error(CellError::Ref)
        );
    }

    #[test]
    fn text_in_numeric_context_is_value_error() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_text(0, 0, "hello");
        assert_eq!(eval(&sheet, "=A1+1"), EvalResult::Error(CellError::Value));
    }

    #[test]
    fn bare_range_collapses_to_sum() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 1.0);
        sheet.set_number(1, 0, 2.0);
        sheet.set_number(2, 0, 3.0);
        assert_number(eval(&sheet, "=A1:A3"), 6.0);
        assert_number(eval(&sheet, "=A1:A3+10"), 16.0);
    }

    #[test]
    fn aggregates_over_ranges() {
        let mut sheet = Sheet::new(10, 10);
        for (i, v) in [10.0, 20.0, 30.0, 40.0, 50.0].iter().enumerate() {
            sheet.set_number(i, 0, *v);
        }
        assert_number(eval(&sheet, "=SUM(A1:A5)"), 150.0);
        assert_number(eval(&sheet, "=AVG(A1:A5)"), 30.0);
        assert_number(eval(&sheet, "=MAX(A1:A5)"), 50.0);
        assert_number(eval(&sheet, "=MIN(A1:A5)"), 10.0);
    }

    #[test]
    fn range_skips_text_but_counts_empties() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 10.0);
        sheet.set_text(1, 0, "label");
        // A3 left empty: contributes 0.0
        assert_number(eval(&sheet, "=SUM(A1:A3)"), 10.0);
        // Empty slot participates in MIN as a zero
        assert_number(eval(&sheet, "=MIN(A1:A3)"), 0.0);
    }

    #[test]
    fn median_odd_and_even() {
        let mut sheet = Sheet::new(10, 10);
        for (i, v) in [5.0, 1.0, 3.0].iter().enumerate() {
            sheet.set_number(i, 0, *v);
        }
        assert_number(eval(&sheet, "=MEDIAN(A1:A3)"), 3.0);
        sheet.set_number(3, 0, 7.0);
        assert_number(eval(&sheet, "=MEDIAN(A1:A4)"), 4.0);
    }

    #[test]
    fn mode_prefers_first_occurrence_on_ties() {
        let mut sheet = Sheet::new(10, 10);
        for (i, v) in [2.0, 1.0, 1.0, 2.0, 3.0].iter().enumerate() {
            sheet.set_number(i, 0, *v);
        }
        // 2.0 and 1.0 both appear twice; 2.0 appeared first
        assert_number(eval(&sheet, "=MODE(A1:A5)"), 2.0);
    }

    #[test]
    fn power_function() {
        let sheet = Sheet::new(10, 10);
        assert_number(eval(&sheet, "=POWER(2, 10)"), 1024.0);
        assert_number(eval(&sheet, "=POWER(9, 0.5)"), 3.0);
    }

    #[test]
    fn comparisons_yield_one_or_zero() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 10.0);
        assert_number(eval(&sheet, "=A1>5"), 1.0);
        assert_number(eval(&sheet, "=A1<5"), 0.0);
        assert_number(eval(&sheet, "=A1=10"), 1.0);
        assert_number(eval(&sheet, "=A1<>10"), 0.0);
        assert_number(eval(&sheet, "=A1>=10"), 1.0);
    }

    #[test]
    fn equality_uses_epsilon() {
        let sheet = Sheet::new(10, 10);
        assert_number(eval(&sheet, "=0.1+0.2=0.3"), 1.0);
    }

    #[test]
    fn string_comparison_against_text_cell() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_text(0, 0, "Apple");
        assert_number(eval(&sheet, "=A1=\"Apple\""), 1.0);
        assert_number(eval(&sheet, "=A1=\"Banana\""), 0.0);
        assert_number(eval(&sheet, "=A1<\"Banana\""), 1.0);
        assert_number(eval(&sheet, "=A1<>\"Apple\""), 0.0);
    }

    #[test]
    fn string_comparison_with_empty_or_numeric_cell_reads_empty() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 7.0);
        // Numeric cell reads as "" for string comparison
        assert_number(eval(&sheet, "=A1=\"\""), 1.0);
        // Empty cell too
        assert_number(eval(&sheet, "=B1=\"\""), 1.0);
        assert_number(eval(&sheet, "=B1=\"x\""), 0.0);
    }

    #[test]
    fn if_selects_numeric_branches() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 10.0);
        assert_number(eval(&sheet, "=IF(A1>5, 100, 200)"), 100.0);
        assert_number(eval(&sheet, "=IF(A1<5, 100, 200)"), 200.0);
    }

    #[test]
    fn if_string_branch_produces_text() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 10.0);
        assert_eq!(
            eval(&sheet, "=IF(A1>5, \"High\", \"Low\")"),
            EvalResult::Text("High".to_string())
        );
        sheet.set_number(0, 0, 1.0);
        assert_eq!(
            eval(&sheet, "=IF(A1>5, \"High\", \"Low\")"),
            EvalResult::Text("Low".to_string())
        );
    }

    #[test]
    fn if_requires_three_arguments() {
        let sheet = Sheet::new(10, 10);
        assert_eq!(
            eval(&sheet, "=IF(1, 2)"),
            EvalResult::Error(CellError::Value)
        );
    }

    #[test]
    fn xlookup_exact_text_key() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_text(0, 0, "Apple");
        sheet.set_text(1, 0, "Orange");
        sheet.set_text(2, 0, "Banana");
        sheet.set_number(0, 1, 0.5);
        sheet.set_number(1, 1, 0.75);
        sheet.set_number(2, 1, 0.3);

        assert_number(eval(&sheet, "=XLOOKUP(\"Orange\", A1:A3, B1:B3, 0)"), 0.75);
        assert_eq!(
            eval(&sheet, "=XLOOKUP(\"Grape\", A1:A3, B1:B3, 0)"),
            EvalResult::Error(CellError::Na)
        );
    }

    #[test]
    fn xlookup_numeric_exact_and_approximate() {
        let mut sheet = Sheet::new(10, 10);
        for (i, v) in [10.0, 20.0, 30.0].iter().enumerate() {
            sheet.set_number(i, 0, *v);
            sheet.set_number(i, 1, (i + 1) as f64 * 100.0);
        }

        assert_number(eval(&sheet, "=XLOOKUP(20, A1:A3, B1:B3)"), 200.0);
        assert_eq!(
            eval(&sheet, "=XLOOKUP(25, A1:A3, B1:B3)"),
            EvalResult::Error(CellError::Na)
        );
        // Approximate: largest value <= 25 is 20
        assert_number(eval(&sheet, "=XLOOKUP(25, A1:A3, B1:B3, 1)"), 200.0);
    }

    #[test]
    fn xlookup_horizontal_direction() {
        let mut sheet = Sheet::new(10, 10);
        for (j, v) in [10.0, 20.0, 30.0].iter().enumerate() {
            sheet.set_number(0, j, *v);
            sheet.set_number(1, j, (j + 1) as f64);
        }
        assert_number(eval(&sheet, "=XLOOKUP(30, A1:C1, A2:C2)"), 3.0);
    }

    #[test]
    fn xlookup_shape_mismatch_is_ref_error() {
        let sheet = Sheet::new(10, 10);
        assert_eq!(
            eval(&sheet, "=XLOOKUP(1, A1:A3, B1:B2)"),
            EvalResult::Error(CellError::Ref)
        );
    }

    #[test]
    fn aggregate_propagates_range_errors() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_number(0, 0, 1.0);
        sheet.set_formula(1, 0, "=1/0");
        sheet.recalculate();
        assert_eq!(
            eval(&sheet, "=SUM(A1:A3)"),
            EvalResult::Error(CellError::DivZero)
        );
    }

    #[test]
    fn errored_reference_is_inherited() {
        let mut sheet = Sheet::new(10, 10);
        sheet.set_formula(0, 0, "=1/0");
        sheet.recalculate();
        assert_eq!(
            eval(&sheet, "=A1+1"),
            EvalResult::Error(CellError::DivZero)
        );
    }

    #[test]
    fn range_cap_limits_contributions() {
        let mut sheet = Sheet::new(2000, 2);
        // 1500 rows of ones: only the first MAX_RANGE_VALUES contribute
        for row in 0..1500 {
            sheet.set_number(row, 0, 1.0);
        }
        assert_number(eval(&sheet, "=SUM(A1:A1500)"), MAX_RANGE_VALUES as f64);
    }
}
