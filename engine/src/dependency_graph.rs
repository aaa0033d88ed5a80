//! FILENAME: engine/src/dependency_graph.rs
//! PURPOSE: Tracks cell dependencies and orders recalculation.
//! CONTEXT: The recalculation engine needs every formula cell evaluated
//! after all of its inputs. This module maintains precedent/dependent
//! mappings and produces a topological order (Kahn's algorithm) over the
//! formula cells. Cells that cannot be ordered are members of a reference
//! cycle (or sit downstream of one) and are reported separately so the
//! caller can mark them with a reference error.
//!
//! TERMINOLOGY:
//! - Precedents: cells a formula references (its inputs).
//!   If A3 = A1 + A2, then A1 and A2 are precedents of A3.
//! - Dependents: cells that reference a given cell (reverse lookup).
//!   If A3 = A1 + A2, then A3 is a dependent of A1 and A2.

use crate::coord::CellCoord;
use std::collections::{HashMap, HashSet, VecDeque};

/// The dependency graph tracks relationships between cells.
/// It maintains both forward (precedents) and reverse (dependents)
/// mappings for efficient lookups in either direction.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// For each cell, the set of cells it directly depends on.
    precedents: HashMap<CellCoord, HashSet<CellCoord>>,

    /// For each cell, the set of cells that directly depend on it.
    dependents: HashMap<CellCoord, HashSet<CellCoord>>,
}

impl DependencyGraph {
    /// Creates a new, empty dependency graph.
    pub fn new() -> Self {
        DependencyGraph {
            precedents: HashMap::new(),
            dependents: HashMap::new(),
        }
    }

    /// Sets the dependencies for a cell, replacing any previous set.
    /// Updates both the precedents and dependents mappings.
    pub fn set_dependencies(&mut self, cell: CellCoord, new_precedents: HashSet<CellCoord>) {
        self.clear_dependencies(cell);

        if !new_precedents.is_empty() {
            for &prec in &new_precedents {
                self.dependents.entry(prec).or_default().insert(cell);
            }
            self.precedents.insert(cell, new_precedents);
        }
    }

    /// Clears all dependencies for a cell.
    pub fn clear_dependencies(&mut self, cell: CellCoord) {
        if let Some(old_precs) = self.precedents.remove(&cell) {
            for prec in old_precs {
                if let Some(deps) = self.dependents.get_mut(&prec) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&prec);
                    }
                }
            }
        }
    }

    /// Returns the direct precedents of a cell, if it has any.
    pub fn get_precedents(&self, cell: CellCoord) -> Option<&HashSet<CellCoord>> {
        self.precedents.get(&cell)
    }

    /// Returns the direct dependents of a cell, if any exist.
    pub fn get_dependents(&self, cell: CellCoord) -> Option<&HashSet<CellCoord>> {
        self.dependents.get(&cell)
    }

    /// Produces an evaluation order for the given set of formula cells
    /// using Kahn's algorithm, counting only edges between members of the
    /// set (a formula depending on a plain number cell has no ordering
    /// constraint from it).
    ///
    /// Returns `(ordered, cyclic)`: `ordered` lists every cell that can be
    /// evaluated, each after all of its in-set precedents; `cyclic` lists
    /// the leftovers (members of a reference cycle and any cell whose
    /// inputs are stuck behind one). The two lists partition the input set.
    pub fn evaluation_order(
        &self,
        cells: &HashSet<CellCoord>,
    ) -> (Vec<CellCoord>, Vec<CellCoord>) {
        // In-degree restricted to edges within the subset
        let mut in_degree: HashMap<CellCoord, usize> = HashMap::new();
        for &cell in cells {
            let degree = self
                .precedents
                .get(&cell)
                .map(|precs| precs.iter().filter(|p| cells.contains(p)).count())
                .unwrap_or(0);
            in_degree.insert(cell, degree);
        }

        let mut queue: VecDeque<CellCoord> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&cell, _)| cell)
            .collect();

        let mut ordered = Vec::with_capacity(cells.len());

        while let Some(cell) = queue.pop_front() {
            ordered.push(cell);

            if let Some(deps) = self.dependents.get(&cell) {
                for &dep in deps {
                    if let Some(degree) = in_degree.get_mut(&dep) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dep);
                        }
                    }
                }
            }
        }

        // Anything not processed is stuck in (or behind) a cycle
        let cyclic: Vec<CellCoord> = if ordered.len() == cells.len() {
            Vec::new()
        } else {
            let done: HashSet<CellCoord> = ordered.iter().copied().collect();
            cells.iter().copied().filter(|c| !done.contains(c)).collect()
        };

        (ordered, cyclic)
    }
}
