//! The spreadsheet: cell store plus dependency graph, and the operations
//! that keep every value consistent after an edit.

use std::collections::HashMap;

use super::cell::{Cell, CellInfo, Updates};
use super::cell_id::CellId;
use super::cycle::find_cycle;
use super::eval::{direct_refs, evaluate};
use super::graph::DepGraph;
use super::resolve::{GridBounds, Resolver};
use crate::error::{EngineError, Result};
use crate::formula::{Ast, parse};

/// A single named spreadsheet.
///
/// Operations take `&mut self` and run to completion; callers sharing one
/// spreadsheet between threads must serialize access themselves.
#[derive(Clone, Debug)]
pub struct Spreadsheet {
    name: String,
    cells: HashMap<CellId, Cell>,
    graph: DepGraph,
    resolver: Resolver,
}

impl Spreadsheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_bounds(name, GridBounds::default())
    }

    pub fn with_bounds(name: impl Into<String>, bounds: GridBounds) -> Self {
        Spreadsheet {
            name: name.into(),
            cells: HashMap::new(),
            graph: DepGraph::new(),
            resolver: Resolver::new(bounds),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Parse and bounds-check a cell id.
    pub fn cell_id(&self, name: &str) -> Result<CellId> {
        self.resolver.cell_id(name)
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// All cell records, placeholders included, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellId, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Current value of a cell; 0 for cells that do not exist.
    pub fn value(&self, id: &CellId) -> f64 {
        self.cells.get(id).map(|c| c.value).unwrap_or(0.0)
    }

    /// Cells whose formulas read `id`, in the order the edges were added.
    pub fn dependents(&self, id: &CellId) -> &[CellId] {
        self.graph.dependents(id)
    }

    /// Cells that `id`'s formula reads.
    pub fn precedents(&self, id: &CellId) -> &[CellId] {
        self.graph.precedents(id)
    }

    /// Formula text and value of a cell. Unknown cells report an empty
    /// formula and value 0.
    pub fn query(&self, cell_id: &str) -> Result<CellInfo> {
        let id = self.cell_id(cell_id)?;
        Ok(match self.cells.get(&id) {
            Some(cell) => CellInfo {
                formula: cell.formula.clone(),
                value: cell.value,
            },
            None => CellInfo {
                formula: String::new(),
                value: 0.0,
            },
        })
    }

    /// Set `cell_id` to the result of evaluating `formula`, then recompute
    /// every cell that depends on it. Returns every recomputed value.
    pub fn set_cell(&mut self, cell_id: &str, formula: &str) -> Result<Updates> {
        let id = self.cell_id(cell_id)?;
        let ast = parse(formula, &id)?;
        self.set_cell_ast(id, formula.trim(), ast)
    }

    /// Commit an already parsed formula for `id`.
    ///
    /// Nothing is modified unless every check passes.
    pub fn set_cell_ast(
        &mut self,
        id: CellId,
        formula: impl Into<String>,
        ast: Ast,
    ) -> Result<Updates> {
        let id = self.resolver.check(id)?;
        let refs = direct_refs(&self.resolver, &id, &ast)?;
        if let Some(path) = find_cycle(&self.graph, &id, &refs) {
            tracing::debug!(cell = %id, cycle_len = path.len(), "rejected circular reference");
            return Err(EngineError::CircularRef { path });
        }
        let value = evaluate(&self.resolver, &id, &ast, &|c: &CellId| self.value(c))?;

        for r in &refs {
            self.cells.entry(*r).or_insert_with(Cell::placeholder);
        }
        self.graph.replace_edges(id, &refs);
        let cell = self.cells.entry(id).or_insert_with(Cell::placeholder);
        cell.formula = formula.into();
        cell.ast = Some(ast);
        cell.value = value;
        tracing::debug!(cell = %id, refs = refs.len(), value, "committed formula");

        let mut updates = Updates::new();
        updates.insert(id, value);
        self.cascade(&id, &mut updates);
        Ok(updates)
    }

    /// Turn `cell_id` back into a placeholder and recompute its dependents.
    ///
    /// Removing a cell that does not exist or is already a placeholder is a
    /// no-op returning no updates.
    pub fn remove_cell(&mut self, cell_id: &str) -> Result<Updates> {
        let id = self.cell_id(cell_id)?;
        Ok(self.remove_id(&id))
    }

    fn remove_id(&mut self, id: &CellId) -> Updates {
        let mut updates = Updates::new();
        let Some(cell) = self.cells.get_mut(id) else {
            return updates;
        };
        if cell.is_placeholder() {
            return updates;
        }
        *cell = Cell::placeholder();
        self.graph.replace_edges(*id, &[]);
        tracing::debug!(cell = %id, "removed formula");

        updates.insert(*id, 0.0);
        self.cascade(id, &mut updates);
        updates
    }

    /// Put `id` back to `prior`, as captured from [`Spreadsheet::cell`]
    /// before an edit, and recompute its dependents.
    ///
    /// Placeholders that only the undone edit was reading are dropped.
    pub fn restore(&mut self, id: CellId, prior: Option<Cell>) -> Updates {
        let read: Vec<CellId> = self.graph.precedents(&id).to_vec();
        let updates = match prior {
            Some(Cell {
                formula,
                ast: Some(ast),
                ..
            }) => self.set_cell_ast(id, formula, ast).unwrap_or_else(|e| {
                debug_assert!(false, "restoring {id} failed: {e}");
                tracing::warn!(cell = %id, error = %e, "restore failed");
                self.remove_id(&id)
            }),
            Some(_) => self.remove_id(&id),
            None => {
                let updates = self.remove_id(&id);
                self.drop_orphan(&id);
                updates
            }
        };
        for r in &read {
            self.drop_orphan(r);
        }
        tracing::debug!(cell = %id, "restored");
        updates
    }

    /// Forget a placeholder nothing reads.
    fn drop_orphan(&mut self, id: &CellId) {
        let orphan = self.cells.get(id).is_some_and(Cell::is_placeholder)
            && self.graph.dependents(id).is_empty();
        if orphan {
            self.cells.remove(id);
        }
    }

    /// Copy the formula of `src` into `dest`, re-homing its relative
    /// references. Copying from an empty cell removes `dest`.
    pub fn copy_cell(&mut self, dest: &str, src: &str) -> Result<Updates> {
        let dest_id = self.cell_id(dest)?;
        let src_id = self.cell_id(src)?;
        let Some(ast) = self.cells.get(&src_id).and_then(|c| c.ast.clone()) else {
            return Ok(self.remove_id(&dest_id));
        };
        let formula = ast.to_formula(&dest_id, &self.resolver)?;
        self.set_cell_ast(dest_id, formula, ast)
    }

    /// Drop every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.graph.clear();
        tracing::debug!(sheet = %self.name, "cleared");
    }

    /// Every non-placeholder cell with its formula, ordered so that a cell
    /// comes after every cell it reads (ties in row-major order). Replaying
    /// the result through [`Spreadsheet::set_cell`] rebuilds the sheet.
    pub fn dump(&self) -> Vec<(CellId, String)> {
        self.formula_cells_in_order()
            .into_iter()
            .map(|(id, cell)| (id, cell.formula.clone()))
            .collect()
    }

    /// Like [`Spreadsheet::dump`], with each cell's current value.
    pub fn dump_with_values(&self) -> Vec<(CellId, String, f64)> {
        self.formula_cells_in_order()
            .into_iter()
            .map(|(id, cell)| (id, cell.formula.clone(), cell.value))
            .collect()
    }

    /// Replace the whole sheet with `cells` (cell id, formula pairs, in any
    /// order). Either every formula is accepted or the sheet is unchanged.
    pub fn load<I, K, V>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut staged = Spreadsheet::with_bounds(self.name.clone(), self.resolver.bounds());
        for (cell_id, formula) in cells {
            staged.set_cell(cell_id.as_ref(), formula.as_ref())?;
        }
        *self = staged;
        Ok(())
    }

    fn formula_cells_in_order(&self) -> Vec<(CellId, &Cell)> {
        let mut ids: Vec<CellId> = self
            .cells
            .iter()
            .filter(|(_, cell)| !cell.is_placeholder())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        self.graph
            .evaluation_order(ids)
            .into_iter()
            .filter_map(|id| self.cells.get(&id).map(|cell| (id, cell)))
            .filter(|(_, cell)| !cell.is_placeholder())
            .collect()
    }

    /// Recompute everything downstream of `start` in dependency order.
    ///
    /// Every cell on the way was accepted against the same bounds, so its
    /// references still resolve; should one not, it evaluates to 0.
    fn cascade(&mut self, start: &CellId, updates: &mut Updates) {
        let _span = tracing::debug_span!("cascade", start = %start).entered();
        let order = self.graph.cascade_order(start);
        for id in order {
            let Some(ast) = self.cells.get(&id).and_then(|c| c.ast.as_ref()) else {
                continue;
            };
            let value = evaluate(&self.resolver, &id, ast, &|c: &CellId| self.value(c))
                .unwrap_or_else(|e| {
                    debug_assert!(false, "recompute of {id} failed: {e}");
                    tracing::warn!(cell = %id, error = %e, "recompute failed");
                    0.0
                });
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.value = value;
            }
            tracing::trace!(cell = %id, value, "recomputed");
            updates.insert(id, value);
        }
    }
}
