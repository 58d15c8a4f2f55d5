//! Cell records and the changed-value map.

use serde::Serialize;
use std::collections::BTreeMap;

use super::cell_id::CellId;
use crate::formula::Ast;

/// A cell in the spreadsheet.
///
/// A placeholder is a cell that exists only because another formula reads
/// it: it has no formula, no AST, and value 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    /// Formula text as entered; empty for a placeholder.
    pub formula: String,
    pub ast: Option<Ast>,
    pub value: f64,
}

impl Cell {
    pub fn placeholder() -> Cell {
        Cell::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.ast.is_none()
    }
}

/// Formula and value of one cell, as reported to clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellInfo {
    pub formula: String,
    pub value: f64,
}

/// Cells whose values were (re)computed by an operation, with their new
/// values. Iterates in row-major order.
pub type Updates = BTreeMap<CellId, f64>;
