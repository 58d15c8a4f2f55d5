//! Formula persistence.
//!
//! Only formula text is stored, keyed by (spreadsheet name, cell id). Values
//! and dependency edges are rebuilt by replaying the formulas.

mod file;
mod memory;
pub mod parser;
pub mod writer;

pub use file::FileStore;
pub use memory::MemStore;

use crate::error::{Result, SheetcalcError};
use sheetcalc_engine::engine::CellId;

/// Backing store for spreadsheet formulas.
pub trait SpreadsheetStore: Send + Sync {
    /// Insert or replace the formula of one cell.
    fn set_cell_expr(&self, sheet: &str, cell: &CellId, expr: &str) -> Result<()>;

    /// Forget one cell. Forgetting an unknown cell is not an error.
    fn remove_cell(&self, sheet: &str, cell: &CellId) -> Result<()>;

    /// Forget every cell of a spreadsheet.
    fn clear(&self, sheet: &str) -> Result<()>;

    /// Every stored (cell, formula) pair, in row-major order.
    fn cells(&self, sheet: &str) -> Result<Vec<(CellId, String)>>;

    /// Replace the whole spreadsheet with `cells`.
    fn replace_all(&self, sheet: &str, cells: &[(CellId, String)]) -> Result<()>;
}

/// Spreadsheet names double as file names, so they are restricted to ASCII
/// letters, digits, `_` and `-`.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SheetcalcError::InvalidSheetName(name.to_string()))
    }
}
