//! Error types for the sheetcalc command line

use sheetcalc_core::SheetcalcError;
use sheetcalc_engine::ErrorKind;
use thiserror::Error;

/// Errors reported for a single command
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Sheet(#[from] SheetcalcError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Stable code printed as `error[CODE]`.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Usage(_) => "USAGE",
            CliError::Sheet(e) => e.code(),
            CliError::Output(_) => "OUTPUT",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Sheet(e) => match e.kind() {
                Some(ErrorKind::Syntax) => 2,
                Some(ErrorKind::CircularRef) => 3,
                Some(ErrorKind::RefOutOfRange) => 4,
                None => 1,
            },
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
