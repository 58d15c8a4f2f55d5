//! Rendering command results as plain text or JSON.

use serde_json::json;
use sheetcalc_core::{CellId, CellInfo, Updates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Result of one command, ready to print.
#[derive(Debug)]
pub enum Outcome {
    Updates(Updates),
    Cell(String, CellInfo),
    Dump(Vec<(CellId, String)>),
    DumpValues(Vec<(CellId, String, f64)>),
    Done,
}

/// Render `outcome`; `None` means there is nothing to print.
pub fn render(format: OutputFormat, outcome: &Outcome) -> serde_json::Result<Option<String>> {
    match format {
        OutputFormat::Plain => Ok(render_plain(outcome)),
        OutputFormat::Json => render_json(outcome),
    }
}

fn render_plain(outcome: &Outcome) -> Option<String> {
    let lines: Vec<String> = match outcome {
        Outcome::Updates(updates) => updates
            .iter()
            .map(|(cell, value)| format!("{} = {}", cell, value))
            .collect(),
        Outcome::Cell(cell, info) => vec![describe(cell, &info.formula, info.value)],
        Outcome::Dump(cells) => cells
            .iter()
            .map(|(cell, formula)| format!("{}: ={}", cell, formula))
            .collect(),
        Outcome::DumpValues(cells) => cells
            .iter()
            .map(|(cell, formula, value)| describe(&cell.to_string(), formula, *value))
            .collect(),
        Outcome::Done => return None,
    };
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn describe(cell: &str, formula: &str, value: f64) -> String {
    if formula.is_empty() {
        format!("{} = {}", cell, value)
    } else {
        format!("{} = {} (={})", cell, value, formula)
    }
}

// Non-finite values have no JSON form and come out as null.
fn render_json(outcome: &Outcome) -> serde_json::Result<Option<String>> {
    let value = match outcome {
        // Serialized directly so the object keeps row-major key order.
        Outcome::Updates(updates) => return serde_json::to_string(updates).map(Some),
        Outcome::Cell(cell, info) => json!({
            "cell": cell,
            "formula": info.formula,
            "value": info.value,
        }),
        Outcome::Dump(cells) => cells
            .iter()
            .map(|(cell, formula)| json!({ "cell": cell, "formula": formula }))
            .collect(),
        Outcome::DumpValues(cells) => cells
            .iter()
            .map(|(cell, formula, value)| {
                json!({ "cell": cell, "formula": formula, "value": value })
            })
            .collect(),
        Outcome::Done => return Ok(None),
    };
    serde_json::to_string(&value).map(Some)
}
