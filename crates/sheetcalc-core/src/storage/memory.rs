//! In-memory store, for tests and `--memory` sessions.

use dashmap::DashMap;
use std::collections::BTreeMap;

use super::{SpreadsheetStore, validate_sheet_name};
use crate::error::Result;
use sheetcalc_engine::engine::CellId;

#[derive(Debug, Default)]
pub struct MemStore {
    sheets: DashMap<String, BTreeMap<CellId, String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpreadsheetStore for MemStore {
    fn set_cell_expr(&self, sheet: &str, cell: &CellId, expr: &str) -> Result<()> {
        validate_sheet_name(sheet)?;
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .insert(*cell, expr.to_string());
        Ok(())
    }

    fn remove_cell(&self, sheet: &str, cell: &CellId) -> Result<()> {
        validate_sheet_name(sheet)?;
        if let Some(mut cells) = self.sheets.get_mut(sheet) {
            cells.remove(cell);
        }
        Ok(())
    }

    fn clear(&self, sheet: &str) -> Result<()> {
        validate_sheet_name(sheet)?;
        self.sheets.remove(sheet);
        Ok(())
    }

    fn cells(&self, sheet: &str) -> Result<Vec<(CellId, String)>> {
        validate_sheet_name(sheet)?;
        Ok(self
            .sheets
            .get(sheet)
            .map(|cells| cells.iter().map(|(id, f)| (*id, f.clone())).collect())
            .unwrap_or_default())
    }

    fn replace_all(&self, sheet: &str, cells: &[(CellId, String)]) -> Result<()> {
        validate_sheet_name(sheet)?;
        let cells: BTreeMap<CellId, String> = cells.iter().cloned().collect();
        self.sheets.insert(sheet.to_string(), cells);
        Ok(())
    }
}
