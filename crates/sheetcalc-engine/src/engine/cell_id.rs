//! Cell identifier parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell ids
//! (e.g., "a1", "b2", "aa100") and zero-indexed column/row coordinates.
//! The canonical string form is lowercase; parsing is case-insensitive.
//!
//! # Examples
//!
//! ```ignore
//! let cell: CellId = "B3".parse().unwrap();
//! assert_eq!(cell.col, 1);  // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "b3");
//! ```

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

use crate::error::EngineError;

/// An absolute cell position (0-indexed).
///
/// Field order gives the derived `Ord` a row-major ordering, which is the
/// order used for deterministic output everywhere in the engine.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CellId {
    pub row: usize,
    pub col: usize,
}

impl CellId {
    pub fn new(col: usize, row: usize) -> CellId {
        CellId { row, col }
    }

    /// Parse a cell id from spreadsheet notation (e.g., "a1", "B2", "aa10").
    /// Returns None if the input is invalid.
    pub fn parse_a1(name: &str) -> Option<CellId> {
        let caps = cell_id_re().captures(name.trim())?;
        let col = letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellId::new(col, row))
    }

    /// Convert column index to lowercase letters (0 -> a, 25 -> z, 26 -> aa).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'a' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

/// Longest column name accepted; anything wider is far past any grid.
const MAX_COL_LETTERS: usize = 13;

/// Convert column letters (any case) to a 0-indexed column.
pub(crate) fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.len() > MAX_COL_LETTERS {
        return None;
    }
    let mut col_acc = 0usize;
    for c in letters.to_ascii_lowercase().bytes() {
        if !c.is_ascii_lowercase() {
            return None;
        }
        let digit = (c - b'a') as usize + 1;
        col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
    }
    col_acc.checked_sub(1)
}

fn cell_id_re() -> &'static Regex {
    static CELL_ID_RE: OnceLock<Regex> = OnceLock::new();
    CELL_ID_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell id regex must compile")
    })
}

impl std::str::FromStr for CellId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| EngineError::InvalidCellId(s.to_string()))
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellId::col_to_letters(self.col), self.row + 1)
    }
}

// Serialized as the canonical string so cell ids work as JSON object keys.
impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
