//! Parser for the .sheet file format

use crate::error::{Result, SheetcalcError};
use sheetcalc_engine::engine::CellId;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Parse a .sheet file. A missing file is an empty spreadsheet.
pub fn parse_sheet(path: &Path) -> Result<BTreeMap<CellId, String>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_sheet_content(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Parse .sheet content from a string into cell formulas.
///
/// A cell listed twice keeps its last formula.
pub fn parse_sheet_content(content: &str) -> Result<BTreeMap<CellId, String>> {
    let mut cells = BTreeMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Parse "CELL: =FORMULA" format
        let Some((cell_str, formula_str)) = line.split_once(':') else {
            return Err(SheetcalcError::Parse {
                line: line_num + 1,
                message: "Expected 'CELL: =FORMULA' format".to_string(),
            });
        };

        let cell_str = cell_str.trim();
        let cell = CellId::parse_a1(cell_str).ok_or_else(|| SheetcalcError::Parse {
            line: line_num + 1,
            message: format!("Invalid cell id: {}", cell_str),
        })?;

        let Some(formula) = formula_str.trim().strip_prefix('=') else {
            return Err(SheetcalcError::Parse {
                line: line_num + 1,
                message: format!("Formula for {} must start with '='", cell),
            });
        };
        let formula = formula.trim();
        if formula.is_empty() {
            return Err(SheetcalcError::Parse {
                line: line_num + 1,
                message: format!("Empty formula for {}", cell),
            });
        }

        cells.insert(cell, formula.to_string());
    }

    Ok(cells)
}
