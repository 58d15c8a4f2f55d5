//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`CellId`] - Cell id parsing (A1 notation ↔ row/col indices)
//! - [`Resolver`], [`GridBounds`] - Relative reference resolution within the grid
//! - [`evaluate`], [`direct_refs`] - Formula evaluation and the cells a formula reads
//! - [`DepGraph`] - Dependents/precedents adjacency and traversal orders
//! - [`find_cycle`] - Circular dependency detection before a commit
//! - [`Spreadsheet`] - The façade: set/remove/copy/clear/dump with cascading recompute

mod cell;
pub(crate) mod cell_id;
mod cycle;
mod eval;
mod graph;
mod resolve;
mod sheet;

pub use cell::{Cell, CellInfo, Updates};
pub use cell_id::CellId;
pub use cycle::find_cycle;
pub use eval::{direct_refs, evaluate};
pub use graph::DepGraph;
pub use resolve::{DEFAULT_COLS, DEFAULT_ROWS, GridBounds, Resolver};
pub use sheet::Spreadsheet;
