//! Circular dependency detection for formula cells.
//!
//! Checked before a formula is committed: giving `cell` the precedents
//! `refs` closes a cycle exactly when `cell` is one of them, or when one of
//! them already depends on `cell` (directly or through other cells). The
//! graph is acyclic going in, so the search always terminates.

use std::collections::{HashMap, HashSet};

use super::cell_id::CellId;
use super::graph::DepGraph;

/// Return the cycle that committing `refs` as `cell`'s precedents would
/// create, as a path starting and ending at `cell`.
pub fn find_cycle(graph: &DepGraph, cell: &CellId, refs: &[CellId]) -> Option<Vec<CellId>> {
    if refs.contains(cell) {
        return Some(vec![*cell, *cell]);
    }

    let targets: HashSet<&CellId> = refs.iter().collect();
    let mut parent: HashMap<CellId, CellId> = HashMap::new();
    let mut visited: HashSet<CellId> = HashSet::from([*cell]);
    let mut stack = vec![*cell];

    // Walk everything that depends on `cell`; reaching a ref closes the loop.
    while let Some(current) = stack.pop() {
        for dep in graph.dependents(&current) {
            if !visited.insert(*dep) {
                continue;
            }
            parent.insert(*dep, current);
            if targets.contains(dep) {
                return Some(cycle_path(cell, dep, &parent));
            }
            stack.push(*dep);
        }
    }
    None
}

/// Build `cell -> ... -> found -> cell` from the search's parent links.
fn cycle_path(cell: &CellId, found: &CellId, parent: &HashMap<CellId, CellId>) -> Vec<CellId> {
    let mut path = vec![*cell, *found];
    let mut current = *found;
    while let Some(prev) = parent.get(&current) {
        path.push(*prev);
        current = *prev;
    }
    // Collected backwards from the closing edge.
    path.reverse();
    path
}
