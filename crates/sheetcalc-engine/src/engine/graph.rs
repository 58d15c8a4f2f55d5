//! Dependency graph between cells.
//!
//! ```text
//! A → B  means  "B's formula reads A"  (B is a dependent of A)
//! ```
//!
//! Both directions are stored: `dependents[A]` drives cascading
//! recomputation and cycle checks, `precedents[B]` lets a formula's old
//! edges be dropped when it is replaced. Adjacency lists are kept in
//! insertion order so traversals are deterministic.

use std::collections::{HashMap, HashSet};

use super::cell_id::CellId;

#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    dependents: HashMap<CellId, Vec<CellId>>,
    precedents: HashMap<CellId, Vec<CellId>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells whose formulas read `cell`.
    pub fn dependents(&self, cell: &CellId) -> &[CellId] {
        self.dependents.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells that `cell`'s formula reads.
    pub fn precedents(&self, cell: &CellId) -> &[CellId] {
        self.precedents.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record that `to` reads `from`. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, from: CellId, to: CellId) {
        let deps = self.dependents.entry(from).or_default();
        if deps.contains(&to) {
            return;
        }
        deps.push(to);
        self.precedents.entry(to).or_default().push(from);
    }

    /// Remove the edge `from → to` if present.
    pub fn remove_edge(&mut self, from: &CellId, to: &CellId) {
        if let Some(deps) = self.dependents.get_mut(from) {
            deps.retain(|d| d != to);
            if deps.is_empty() {
                self.dependents.remove(from);
            }
        }
        if let Some(preds) = self.precedents.get_mut(to) {
            preds.retain(|p| p != from);
            if preds.is_empty() {
                self.precedents.remove(to);
            }
        }
    }

    /// Make `cell`'s precedents exactly `new_preds`.
    ///
    /// Stale edges are removed and missing ones appended; edges present in
    /// both keep their position in every adjacency list.
    pub fn replace_edges(&mut self, cell: CellId, new_preds: &[CellId]) {
        let stale: Vec<CellId> = self
            .precedents(&cell)
            .iter()
            .filter(|p| !new_preds.contains(p))
            .copied()
            .collect();
        for pred in stale {
            self.remove_edge(&pred, &cell);
        }
        for pred in new_preds {
            self.add_edge(*pred, cell);
        }
    }

    /// Cells reachable from `start` along dependent edges, excluding `start`,
    /// ordered so every cell comes after all the cells it reads among them.
    pub fn cascade_order(&self, start: &CellId) -> Vec<CellId> {
        let mut order = post_order(std::iter::once(*start), |c| self.dependents(c));
        order.reverse();
        // Reverse post-order of a DAG from a single root starts at the root.
        order.remove(0);
        order
    }

    /// All `cells` ordered so that precedents come before dependents.
    /// `cells` should already be in the desired tie-break order.
    pub fn evaluation_order(&self, cells: impl IntoIterator<Item = CellId>) -> Vec<CellId> {
        post_order(cells, |c| self.precedents(c))
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

/// Iterative depth-first post-order over `edges`, starting from each root in
/// turn. Each cell is emitted once, after everything reachable from it.
fn post_order<'g, I, E>(roots: I, edges: E) -> Vec<CellId>
where
    I: IntoIterator<Item = CellId>,
    E: Fn(&CellId) -> &'g [CellId],
{
    let mut visited: HashSet<CellId> = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<(CellId, usize)> = Vec::new();

    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        stack.push((root, 0));
        while let Some((cell, next)) = stack.last_mut() {
            let cell = *cell;
            let children = edges(&cell);
            if let Some(child) = children.get(*next) {
                *next += 1;
                if visited.insert(*child) {
                    stack.push((*child, 0));
                }
            } else {
                stack.pop();
                order.push(cell);
            }
        }
    }
    order
}
