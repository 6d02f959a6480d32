//! # ledger::ingest
//!
//! Reads the watch-list out of the workbook.
//!
//! Every sheet lists its holdings in the symbol column from the first symbol
//! row down to a terminator row.  On the primary sheet the row just above the
//! terminator is the *last symbol row*, the anchor every relative landmark
//! is measured from.

use tracing::{debug, info, warn};

use super::{CellRef, CellValue, LedgerReader};
use crate::config::Landmarks;
use crate::error::QuoteError;
use crate::models::LocationRef;
use crate::registry::{Registration, SymbolRegistry};

/// The ingested watch-list plus the anchor row of the primary sheet.
#[derive(Debug, Clone)]
pub struct Roster {
    pub registry:        SymbolRegistry,
    pub primary_sheet:   String,
    pub last_symbol_row: u32,
}

/// Scan every sheet and register its symbols in workbook order.
pub fn read_roster(
    ledger: &impl LedgerReader,
    landmarks: &Landmarks,
    max_scan_rows: u32,
) -> Result<Roster, QuoteError> {
    let primary_sheet = ledger.sheet_at(landmarks.primary_sheet)?;
    let mut registry = SymbolRegistry::new(landmarks.terminator.clone());
    let mut last_symbol_row = None;

    for sheet in ledger.sheet_names() {
        let terminator_row = scan_sheet(ledger, &sheet, landmarks, max_scan_rows, &mut registry)?;
        debug!(sheet = %sheet, terminator_row, "Sheet scanned");
        if sheet == primary_sheet {
            last_symbol_row = Some(terminator_row - 1);
        }
    }

    let last_symbol_row = last_symbol_row.ok_or_else(|| {
        QuoteError::Layout(format!("primary sheet {primary_sheet:?} was not scanned"))
    })?;
    if registry.is_empty() {
        return Err(QuoteError::Layout("workbook lists no symbols".into()));
    }

    info!(
        symbols = registry.len(),
        primary_sheet = %primary_sheet,
        last_symbol_row,
        "Watch-list read from workbook"
    );
    Ok(Roster { registry, primary_sheet, last_symbol_row })
}

/// Register one sheet's symbols; returns the terminator's row.
fn scan_sheet(
    ledger: &impl LedgerReader,
    sheet: &str,
    landmarks: &Landmarks,
    max_scan_rows: u32,
    registry: &mut SymbolRegistry,
) -> Result<u32, QuoteError> {
    let first = landmarks.first_symbol_row;
    for row in first..first + max_scan_rows {
        let raw = match ledger.read_value(sheet, CellRef::new(landmarks.symbol_col, row))? {
            CellValue::Text(s) => s,
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => continue,
        };
        let location = LocationRef::new(sheet, row);
        match registry.register(&raw, location.clone()) {
            Registration::Terminator => return Ok(row),
            Registration::Duplicate { symbol, kept } => warn!(
                symbol  = %symbol,
                kept    = %kept,
                dropped = %location,
                "Duplicate symbol — later entry ignored"
            ),
            Registration::Added(_) | Registration::Skipped => {}
        }
    }
    Err(QuoteError::Layout(format!(
        "sheet {sheet:?} has no {:?} row within {max_scan_rows} rows of row {first}",
        landmarks.terminator
    )))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
