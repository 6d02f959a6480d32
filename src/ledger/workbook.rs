//! # ledger::workbook
//!
//! File-backed [`Workbook`]: the portfolio document as JSON.
//!
//! ```text
//! { "sheets": [
//!     { "name": "Sheet1",
//!       "cells": { "C1": { "value": 45446.0, "number_format": "dd-mmm-yy" },
//!                  "A5": { "value": "MSFT Scottrade" },
//!                  "D121": { "value": 0.012, "formula": "=(B121-B120)/B120" } } } ] }
//! ```
//!
//! Formulas are stored, never evaluated.  Derived cells keep whatever value
//! the spreadsheet application last computed for them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{shift_formula_rows, CellRef, CellValue, Font, LedgerReader, LedgerWriter};
use crate::error::QuoteError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default, skip_serializing_if = "CellValue::is_empty")]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "is_neutral")]
    pub font: Font,
}

fn is_neutral(font: &Font) -> bool {
    *font == Font::neutral()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub cells: BTreeMap<String, Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty sheet.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Self {
        self.sheets.push(Sheet { name: name.into(), cells: BTreeMap::new() });
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuoteError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QuoteError::Ledger(format!("cannot open {}: {e}", path.display())))?;
        let workbook: Workbook = serde_json::from_str(&text)
            .map_err(|e| QuoteError::Ledger(format!("{} is not a workbook: {e}", path.display())))?;
        debug!(path = %path.display(), sheets = workbook.sheets.len(), "Workbook loaded");
        Ok(workbook)
    }

    /// Write to a sibling temp file, then rename it over `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), QuoteError> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| QuoteError::Ledger(format!("cannot serialise workbook: {e}")))?;
        std::fs::write(&tmp, text)
            .map_err(|e| QuoteError::Ledger(format!("cannot write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| QuoteError::Ledger(format!("cannot replace {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Workbook saved");
        Ok(())
    }

    pub fn cell(&self, sheet: &str, cell: CellRef) -> Option<&Cell> {
        self.sheet(sheet).ok()?.cells.get(&cell.to_string())
    }

    fn sheet(&self, name: &str) -> Result<&Sheet, QuoteError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| QuoteError::Ledger(format!("no sheet named {name:?}")))
    }

    fn cell_mut(&mut self, sheet: &str, cell: CellRef) -> Result<&mut Cell, QuoteError> {
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.name == sheet)
            .ok_or_else(|| QuoteError::Ledger(format!("no sheet named {sheet:?}")))?;
        Ok(sheet.cells.entry(cell.to_string()).or_default())
    }
}

impl LedgerReader for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read_value(&self, sheet: &str, cell: CellRef) -> Result<CellValue, QuoteError> {
        self.sheet(sheet)?;
        Ok(self.cell(sheet, cell).map(|c| c.value.clone()).unwrap_or_default())
    }

    fn read_formula(&self, sheet: &str, cell: CellRef) -> Result<Option<String>, QuoteError> {
        self.sheet(sheet)?;
        Ok(self.cell(sheet, cell).and_then(|c| c.formula.clone()))
    }
}

impl LedgerWriter for Workbook {
    fn write_formula(&mut self, sheet: &str, cell: CellRef, text: &str) -> Result<(), QuoteError> {
        let target = self.cell_mut(sheet, cell)?;
        let text = text.trim();
        if text.starts_with('=') {
            target.formula = Some(text.to_string());
        } else {
            target.formula = None;
            target.value = match text.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) if text.is_empty() => CellValue::Empty,
                Err(_) => CellValue::Text(text.to_string()),
            };
        }
        Ok(())
    }

    fn write_value(&mut self, sheet: &str, cell: CellRef, value: CellValue) -> Result<(), QuoteError> {
        let target = self.cell_mut(sheet, cell)?;
        target.formula = None;
        target.value = value;
        Ok(())
    }

    fn copy_cell(&mut self, sheet: &str, from: CellRef, to: CellRef) -> Result<(), QuoteError> {
        let mut copy = self
            .sheet(sheet)?
            .cells
            .get(&from.to_string())
            .cloned()
            .unwrap_or_default();
        let delta = to.row as i64 - from.row as i64;
        copy.formula = copy.formula.map(|f| shift_formula_rows(&f, delta));
        *self.cell_mut(sheet, to)? = copy;
        Ok(())
    }

    fn set_number_format(&mut self, sheet: &str, cell: CellRef, format: &str) -> Result<(), QuoteError> {
        self.cell_mut(sheet, cell)?.number_format = Some(format.to_string());
        Ok(())
    }

    fn set_font(&mut self, sheet: &str, cell: CellRef, font: Font) -> Result<(), QuoteError> {
        self.cell_mut(sheet, cell)?.font = font;
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FontColor;

    fn cell(a1: &str) -> CellRef {
        a1.parse().unwrap()
    }

    fn make_workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_sheet("Sheet1").add_sheet("Sheet2");
        wb
    }

    #[test]
    fn test_formula_text_becomes_number() {
        let mut wb = make_workbook();
        wb.write_formula("Sheet1", cell("C5"), "68.38").unwrap();
        assert_eq!(wb.read_value("Sheet1", cell("C5")).unwrap(), CellValue::Number(68.38));
        wb.write_formula("Sheet1", cell("N5"), "").unwrap();
        assert_eq!(wb.read_value("Sheet1", cell("N5")).unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_unknown_sheet_is_error() {
        let wb = make_workbook();
        assert!(matches!(wb.read_value("Sheet9", cell("A1")), Err(QuoteError::Ledger(_))));
    }

    #[test]
    fn test_copy_cell_shifts_formula_and_keeps_format() {
        let mut wb = make_workbook();
        wb.write_formula("Sheet1", cell("D120"), "=(B120-B119)/B119").unwrap();
        wb.set_number_format("Sheet1", cell("D120"), "0.00%").unwrap();
        wb.copy_cell("Sheet1", cell("D120"), cell("D121")).unwrap();

        let copied = wb.cell("Sheet1", cell("D121")).unwrap();
        assert_eq!(copied.formula.as_deref(), Some("=(B121-B120)/B120"));
        assert_eq!(copied.number_format.as_deref(), Some("0.00%"));
    }

    #[test]
    fn test_set_font() {
        let mut wb = make_workbook();
        let red = Font { bold: true, color: FontColor::Indexed(3) };
        wb.set_font("Sheet1", cell("B7"), red).unwrap();
        assert_eq!(wb.cell("Sheet1", cell("B7")).unwrap().font, red);
    }

    #[test]
    fn test_save_and_load() {
        let mut wb = make_workbook();
        wb.write_value("Sheet2", cell("A5"), CellValue::Text("VFIAX".into())).unwrap();
        wb.write_value("Sheet1", cell("C1"), CellValue::Number(45446.0)).unwrap();

        let path = std::env::temp_dir().join(format!("quotegrabber-{}.json", uuid::Uuid::new_v4()));
        wb.save(&path).unwrap();
        let loaded = Workbook::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, wb);
        assert_eq!(loaded.sheet_names(), vec!["Sheet1", "Sheet2"]);
    }
}
