//! Error types for the Sheetcalc engine.

use thiserror::Error;

use crate::engine::CellId;

/// Errors produced by the engine. Every one of them is recoverable by the
/// caller: a rejected operation leaves the spreadsheet unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    #[error("Invalid cell id: {0:?}")]
    InvalidCellId(String),

    #[error("{}", describe_cycle(path))]
    CircularRef { path: Vec<CellId> },

    #[error("Reference from {base} is outside the grid (column {col}, row {row})")]
    RefOutOfRange { base: CellId, col: isize, row: isize },
}

/// Coarse error classification exposed to clients.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Syntax,
    CircularRef,
    RefOutOfRange,
}

impl ErrorKind {
    /// Stable client-facing code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SYNTAX",
            ErrorKind::CircularRef => "CIRCULAR_REF",
            ErrorKind::RefOutOfRange => "REF_OUT_OF_RANGE",
        }
    }
}

impl EngineError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        EngineError::Syntax {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Syntax { .. } | EngineError::InvalidCellId(_) => ErrorKind::Syntax,
            EngineError::CircularRef { .. } => ErrorKind::CircularRef,
            EngineError::RefOutOfRange { .. } => ErrorKind::RefOutOfRange,
        }
    }
}

fn describe_cycle(path: &[CellId]) -> String {
    match path {
        // Direct cycles are reported as [x] or [x, x].
        [cell] | [cell, _] => format!("Circular reference: {} references itself", cell),
        _ => {
            let chain: Vec<String> = path.iter().map(|c| c.to_string()).collect();
            format!("Circular reference: {}", chain.join(" -> "))
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
