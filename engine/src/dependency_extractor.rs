//! FILENAME: engine/src/dependency_extractor.rs
//! PURPOSE: Extracts cell references from parsed AST expressions.
//! CONTEXT: After a formula is parsed into an AST, this module walks the
//! tree to find all cell references. These references are then used to
//! build the dependency graph that orders recalculation. Ranges
//! (e.g., A1:B10) are expanded to include every cell within the range.
//! References outside the sheet's dimensions are dropped here; the
//! evaluator reports them as errors.

use crate::coord::{col_to_index, CellCoord};
use parser::ast::Expression;
use std::collections::HashSet;

/// Walks an expression tree and collects every in-bounds cell coordinate
/// it references, directly or through a range.
pub fn extract_dependencies(expr: &Expression, rows: usize, cols: usize) -> HashSet<CellCoord> {
    let mut deps = HashSet::new();
    walk(expr, rows, cols, &mut deps);
    deps
}

fn walk(expr: &Expression, rows: usize, cols: usize, deps: &mut HashSet<CellCoord>) {
    match expr {
        Expression::Literal(_) => {}

        Expression::CellRef { col, row } => {
            if let Some(coord) = resolve(col, *row, rows, cols) {
                deps.insert(coord);
            }
        }

        Expression::Range { start, end } => {
            let start_coord = match start.as_ref() {
                Expression::CellRef { col, row } => resolve(col, *row, rows, cols),
                _ => None,
            };
            let end_coord = match end.as_ref() {
                Expression::CellRef { col, row } => resolve(col, *row, rows, cols),
                _ => None,
            };
            if let (Some(a), Some(b)) = (start_coord, end_coord) {
                for r in a.0.min(b.0)..=a.0.max(b.0) {
                    for c in a.1.min(b.1)..=a.1.max(b.1) {
                        deps.insert((r, c));
                    }
                }
            }
        }

        Expression::BinaryOp { left, right, .. } => {
            walk(left, rows, cols, deps);
            walk(right, rows, cols, deps);
        }

        Expression::UnaryOp { operand, .. } => {
            walk(operand, rows, cols, deps);
        }

        Expression::FunctionCall { args, .. } => {
            for arg in args {
                walk(arg, rows, cols, deps);
            }
        }
    }
}

fn resolve(col: &str, row: u32, rows: usize, cols: usize) -> Option<CellCoord> {
    let col_idx = col_to_index(col)?;
    let row_idx = (row as usize).checked_sub(1)?;
    if row_idx < rows && col_idx < cols {
        Some((row_idx, col_idx))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    fn deps_of(formula: &str) -> HashSet<CellCoord> {
        let expr = parse(formula).unwrap();
        extract_dependencies(&expr, 100, 26)
    }

    #[test]
    fn extracts_single_references() {
        let deps = deps_of("=A1+B2*C3");
        assert_eq!(deps.len(), 3);
        assert!(deps.contains(&(0, 0)));
        assert!(deps.contains(&(1, 1)));
        assert!(deps.contains(&(2, 2)));
    }

    #[test]
    fn expands_ranges() {
        let deps = deps_of("=SUM(A1:B2)");
        assert_eq!(deps.len(), 4);
        assert!(deps.contains(&(0, 0)));
        assert!(deps.contains(&(0, 1)));
        assert!(deps.contains(&(1, 0)));
        assert!(deps.contains(&(1, 1)));
    }

    #[test]
    fn walks_function_arguments() {
        let deps = deps_of("=IF(A1>5, B1, C1)");
        assert_eq!(deps.len(), 3);
    }

    #[test]
    fn literals_have_no_dependencies() {
        assert!(deps_of("=1+2*3").is_empty());
    }

    #[test]
    fn out_of_bounds_references_are_dropped() {
        let expr = parse("=ZZ999").unwrap();
        let deps = extract_dependencies(&expr, 10, 10);
        assert!(deps.is_empty());
    }

    #[test]
    fn duplicate_references_collapse() {
        let deps = deps_of("=A1+A1+A1");
        assert_eq!(deps.len(), 1);
    }
}
