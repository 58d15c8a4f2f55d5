//! Writer for the .sheet file format

use crate::error::Result;
use sheetcalc_engine::engine::CellId;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Write cell formulas to a .sheet file.
///
/// The content goes to a sibling temp file first and is renamed into place,
/// so readers never see a half-written sheet.
pub fn write_sheet(path: &Path, cells: &BTreeMap<CellId, String>) -> Result<()> {
    let content = write_sheet_content(cells);
    let tmp = path.with_extension("sheet.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write cell formulas to a .sheet format string, in row-major order.
pub fn write_sheet_content(cells: &BTreeMap<CellId, String>) -> String {
    let mut lines = vec!["# Sheetcalc Spreadsheet".to_string()];
    for (cell, formula) in cells {
        lines.push(format!("{}: ={}", cell, formula));
    }
    lines.join("\n") + "\n"
}
