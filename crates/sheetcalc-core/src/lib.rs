//! sheetcalc-core - Spreadsheet services over a pluggable formula store.

pub mod error;
pub mod services;
pub mod storage;

pub use error::{Result, SheetcalcError};
pub use services::SpreadsheetServices;
pub use storage::{FileStore, MemStore, SpreadsheetStore};

pub use sheetcalc_engine::engine::{CellId, CellInfo, GridBounds, Updates};
