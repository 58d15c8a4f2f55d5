//! Error types for Sheetcalc core.

use thiserror::Error;

use sheetcalc_engine::error::{EngineError, ErrorKind};

/// Errors that can occur in the Sheetcalc services
#[derive(Error, Debug)]
pub enum SheetcalcError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid spreadsheet name: {0:?}")]
    InvalidSheetName(String),

    #[error("Stored formula for {sheet}!{cell} was rejected: {source}")]
    Rehydrate {
        sheet: String,
        cell: String,
        #[source]
        source: EngineError,
    },
}

impl SheetcalcError {
    /// Engine error kind, if this error came from a rejected edit.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SheetcalcError::Engine(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Stable client-facing code. Anything that is not an engine rejection
    /// is a storage failure.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.code(),
            None => "DB",
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetcalcError>;
