//! One `.sheet` text file per spreadsheet under a data directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::parser::parse_sheet;
use super::writer::write_sheet;
use super::{SpreadsheetStore, validate_sheet_name};
use crate::error::Result;
use sheetcalc_engine::engine::CellId;

/// Stores each spreadsheet as `<dir>/<sheet>.sheet`.
///
/// Every write rewrites the whole file. Writes to one spreadsheet must be
/// serialized by the caller; the services layer does this per sheet.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened file store");
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, sheet: &str) -> Result<PathBuf> {
        validate_sheet_name(sheet)?;
        Ok(self.dir.join(format!("{sheet}.sheet")))
    }

    fn update(&self, sheet: &str, f: impl FnOnce(&mut BTreeMap<CellId, String>)) -> Result<()> {
        let path = self.path(sheet)?;
        let mut cells = parse_sheet(&path)?;
        f(&mut cells);
        write_sheet(&path, &cells)
    }
}

impl SpreadsheetStore for FileStore {
    fn set_cell_expr(&self, sheet: &str, cell: &CellId, expr: &str) -> Result<()> {
        self.update(sheet, |cells| {
            cells.insert(*cell, expr.to_string());
        })
    }

    fn remove_cell(&self, sheet: &str, cell: &CellId) -> Result<()> {
        let path = self.path(sheet)?;
        if !path.exists() {
            return Ok(());
        }
        self.update(sheet, |cells| {
            cells.remove(cell);
        })
    }

    fn clear(&self, sheet: &str) -> Result<()> {
        let path = self.path(sheet)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn cells(&self, sheet: &str) -> Result<Vec<(CellId, String)>> {
        let path = self.path(sheet)?;
        Ok(parse_sheet(&path)?.into_iter().collect())
    }

    fn replace_all(&self, sheet: &str, cells: &[(CellId, String)]) -> Result<()> {
        let path = self.path(sheet)?;
        let cells: BTreeMap<CellId, String> = cells.iter().cloned().collect();
        write_sheet(&path, &cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetcalcError;

    fn id(s: &str) -> CellId {
        s.parse().unwrap()
    }

    #[test]
    fn test_open_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("sheets");
        let store = FileStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.dir(), root.as_path());
    }

    #[test]
    fn test_set_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set_cell_expr("s", &id("b1"), "a1 + 3").unwrap();
        store.set_cell_expr("s", &id("a1"), "5").unwrap();
        assert!(dir.path().join("s.sheet").exists());

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.cells("s").unwrap(),
            vec![(id("a1"), "5".to_string()), (id("b1"), "a1 + 3".to_string())]
        );
    }

    #[test]
    fn test_remove_clear_and_unknown_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.remove_cell("s", &id("a1")).unwrap();
        assert!(!dir.path().join("s.sheet").exists());

        store.set_cell_expr("s", &id("a1"), "1").unwrap();
        store.set_cell_expr("s", &id("a2"), "2").unwrap();
        store.remove_cell("s", &id("a1")).unwrap();
        assert_eq!(store.cells("s").unwrap(), vec![(id("a2"), "2".to_string())]);

        store.clear("s").unwrap();
        store.clear("s").unwrap();
        assert!(store.cells("s").unwrap().is_empty());
    }

    #[test]
    fn test_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set_cell_expr("s", &id("z9"), "1").unwrap();
        store
            .replace_all("s", &[(id("b1"), "2".to_string()), (id("a1"), "1".to_string())])
            .unwrap();
        assert_eq!(
            store.cells("s").unwrap(),
            vec![(id("a1"), "1".to_string()), (id("b1"), "2".to_string())]
        );
    }

    #[test]
    fn test_corrupt_file_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("s.sheet"), "# header\na1: =1\nbroken\n").unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let err = store.cells("s").unwrap_err();
        assert!(matches!(err, SheetcalcError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_sheet_name_cannot_escape_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let err = store.set_cell_expr("../x", &id("a1"), "1").unwrap_err();
        assert!(matches!(err, SheetcalcError::InvalidSheetName(_)));
    }
}
