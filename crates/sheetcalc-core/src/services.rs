//! Spreadsheet services: the engine façade bound to a formula store.
//!
//! Spreadsheets live in a `DashMap` keyed by name and are rebuilt from the
//! store the first time they are touched. An edit holds that sheet's entry
//! for its whole duration, so edits to one sheet are serialized while other
//! sheets proceed independently.
//!
//! An edit is applied to the live sheet and then persisted. A rejected
//! formula never touches either side; when the write fails, the edited
//! cell is put back the way it was so memory and store still agree.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;

use crate::error::{Result, SheetcalcError};
use crate::storage::{SpreadsheetStore, validate_sheet_name};
use sheetcalc_engine::engine::{Cell, CellId, CellInfo, GridBounds, Spreadsheet, Updates};

pub struct SpreadsheetServices<S: SpreadsheetStore> {
    store: S,
    bounds: GridBounds,
    sheets: DashMap<String, Spreadsheet>,
}

impl<S: SpreadsheetStore> SpreadsheetServices<S> {
    pub fn new(store: S) -> Self {
        Self::with_bounds(store, GridBounds::default())
    }

    pub fn with_bounds(store: S, bounds: GridBounds) -> Self {
        SpreadsheetServices {
            store,
            bounds,
            sheets: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Set `cell` to `expr` and return every recomputed value.
    pub fn evaluate(&self, sheet: &str, cell: &str, expr: &str) -> Result<Updates> {
        let mut current = self.sheet(sheet)?;
        let id = current.cell_id(cell)?;
        let prior = current.cell(&id).cloned();
        let updates = current.set_cell(cell, expr)?;
        let formula = stored_formula(&current, &id);
        self.persist(&mut current, id, prior, || {
            self.store.set_cell_expr(sheet, &id, &formula)
        })?;
        Ok(updates)
    }

    pub fn query(&self, sheet: &str, cell: &str) -> Result<CellInfo> {
        Ok(self.sheet(sheet)?.query(cell)?)
    }

    /// Turn `cell` into a placeholder and return every recomputed value.
    pub fn remove(&self, sheet: &str, cell: &str) -> Result<Updates> {
        let mut current = self.sheet(sheet)?;
        let id = current.cell_id(cell)?;
        let prior = current.cell(&id).cloned();
        let updates = current.remove_cell(cell)?;
        if updates.is_empty() {
            return Ok(updates);
        }
        self.persist(&mut current, id, prior, || self.store.remove_cell(sheet, &id))?;
        Ok(updates)
    }

    /// Copy the formula of `src` into `dest`, shifting its relative
    /// references. An empty `src` removes `dest`.
    pub fn copy(&self, sheet: &str, dest: &str, src: &str) -> Result<Updates> {
        let mut current = self.sheet(sheet)?;
        let dest_id = current.cell_id(dest)?;
        let prior = current.cell(&dest_id).cloned();
        let updates = current.copy_cell(dest, src)?;
        if updates.is_empty() {
            return Ok(updates);
        }
        let formula = stored_formula(&current, &dest_id);
        self.persist(&mut current, dest_id, prior, || {
            if formula.is_empty() {
                self.store.remove_cell(sheet, &dest_id)
            } else {
                self.store.set_cell_expr(sheet, &dest_id, &formula)
            }
        })?;
        Ok(updates)
    }

    pub fn clear(&self, sheet: &str) -> Result<()> {
        let mut current = self.sheet(sheet)?;
        self.store.clear(sheet).inspect_err(|e| {
            tracing::warn!(sheet, error = %e, "store write failed; clear discarded");
        })?;
        current.clear();
        Ok(())
    }

    /// Every formula cell, each after the cells it reads.
    pub fn dump(&self, sheet: &str) -> Result<Vec<(CellId, String)>> {
        Ok(self.sheet(sheet)?.dump())
    }

    pub fn dump_with_values(&self, sheet: &str) -> Result<Vec<(CellId, String, f64)>> {
        Ok(self.sheet(sheet)?.dump_with_values())
    }

    /// Replace the whole spreadsheet. Either every formula is accepted or
    /// nothing changes.
    pub fn load<I, K, V>(&self, sheet: &str, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut current = self.sheet(sheet)?;
        let mut staged = Spreadsheet::with_bounds(sheet, self.bounds);
        staged.load(cells)?;
        let dump = staged.dump();
        self.store.replace_all(sheet, &dump).inspect_err(|e| {
            tracing::warn!(sheet, error = %e, "store write failed; load discarded");
        })?;
        tracing::info!(sheet, cells = dump.len(), "loaded spreadsheet");
        *current = staged;
        Ok(())
    }

    /// Look up a spreadsheet, rebuilding it from the store on first use.
    fn sheet(&self, name: &str) -> Result<RefMut<'_, String, Spreadsheet>> {
        validate_sheet_name(name)?;
        match self.sheets.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_ref()),
            Entry::Vacant(entry) => {
                let sheet = self.rehydrate(name)?;
                Ok(entry.insert(sheet))
            }
        }
    }

    fn rehydrate(&self, name: &str) -> Result<Spreadsheet> {
        let cells = self.store.cells(name)?;
        let mut sheet = Spreadsheet::with_bounds(name, self.bounds);
        for (id, formula) in &cells {
            let cell = id.to_string();
            sheet
                .set_cell(&cell, formula)
                .map_err(|source| SheetcalcError::Rehydrate {
                    sheet: name.to_string(),
                    cell,
                    source,
                })?;
        }
        if !cells.is_empty() {
            tracing::info!(sheet = name, cells = cells.len(), "rehydrated spreadsheet");
        }
        Ok(sheet)
    }

    /// Write an edit of `id` already applied to `current`. If the write
    /// fails, `id` goes back to `prior`.
    fn persist(
        &self,
        current: &mut Spreadsheet,
        id: CellId,
        prior: Option<Cell>,
        write: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        write().inspect_err(|e| {
            tracing::warn!(
                sheet = current.name(),
                cell = %id,
                error = %e,
                "store write failed; edit undone"
            );
            current.restore(id, prior);
        })
    }
}

/// Formula text to store for `id`; empty when it is not a formula cell.
fn stored_formula(sheet: &Spreadsheet, id: &CellId) -> String {
    sheet
        .cell(id)
        .filter(|cell| !cell.is_placeholder())
        .map(|cell| cell.formula.clone())
        .unwrap_or_default()
}
