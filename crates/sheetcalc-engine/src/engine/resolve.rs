//! Reference resolution.
//!
//! A formula stores references relative to its home cell. Resolving one
//! against a base cell yields the absolute [`CellId`] it reads. Positions
//! that fall outside the grid are rejected with
//! [`EngineError::RefOutOfRange`]; they are never clamped or read as 0.

use serde::{Deserialize, Serialize};

use super::cell_id::CellId;
use crate::error::{EngineError, Result};
use crate::formula::CellRef;
use crate::formula::ast::signed;

/// Default number of columns (`a`..`z`).
pub const DEFAULT_COLS: usize = 26;
/// Default number of rows.
pub const DEFAULT_ROWS: usize = 999;

/// Size of the addressable grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub cols: usize,
    pub rows: usize,
}

impl Default for GridBounds {
    fn default() -> Self {
        GridBounds {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl GridBounds {
    fn contains(&self, col: isize, row: isize) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.cols && (row as usize) < self.rows
    }
}

/// Turns relative references into absolute cell ids within fixed bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resolver {
    bounds: GridBounds,
}

impl Resolver {
    pub fn new(bounds: GridBounds) -> Self {
        Resolver { bounds }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Resolve `r` as written in a formula homed at `base`.
    pub fn resolve(&self, base: &CellId, r: &CellRef) -> Result<CellId> {
        let col = r.col.apply(base.col);
        let row = r.row.apply(base.row);
        if !self.bounds.contains(col, row) {
            return Err(EngineError::RefOutOfRange {
                base: *base,
                col,
                row,
            });
        }
        Ok(CellId::new(col as usize, row as usize))
    }

    /// Check that `id` itself lies inside the grid.
    pub fn check(&self, id: CellId) -> Result<CellId> {
        let (col, row) = (signed(id.col), signed(id.row));
        if self.bounds.contains(col, row) {
            Ok(id)
        } else {
            Err(EngineError::RefOutOfRange { base: id, col, row })
        }
    }

    /// Parse a cell id string and check it against the bounds.
    pub fn cell_id(&self, name: &str) -> Result<CellId> {
        self.check(name.parse()?)
    }
}
