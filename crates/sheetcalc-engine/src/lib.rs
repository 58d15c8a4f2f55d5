//! sheetcalc_engine - Spreadsheet engine: formulas, dependency graph and recompute.

pub mod engine;
pub mod error;
pub mod formula;

pub use engine::{CellId, CellInfo, GridBounds, Spreadsheet, Updates};
pub use error::{EngineError, ErrorKind, Result};
