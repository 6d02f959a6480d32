//! # engine::reconcile
//!
//! **ReconciliationEngine** — merges a quote batch into the workbook at most
//! once per trading day.
//!
//! ## Flow
//! ```text
//! stamped date == market date ? ──yes──▶ NoOp (nothing written)
//!        │ no
//!        ▼
//! ReconciliationPlan
//!   1. stamp the market date                       (C1)
//!   2. price + dividend text for every instrument  (C<row>, N<row>)
//!   3. new history row at "next available row":
//!        date │ total ─ carried │ %change ─ copied from row above
//!        return incl./excl. ESPP ─ carried │ avg age ─ carried
//!   4. reset the emphasis of the new total cell
//!   5. bump "next available row"
//! ```
//!
//! The plan is built from reads that do not depend on today's prices.  The
//! carried snapshot cells are read while the plan is *applied*, after step 2,
//! so the history row records totals that include the prices just written.
//!
//! The file-backed [`Workbook`](crate::ledger::Workbook) never recalculates
//! formulas.  A carried cell that holds a formula yields the value the
//! spreadsheet application last computed for it, not one reflecting today's
//! prices.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::Landmarks;
use crate::error::QuoteError;
use crate::ledger::ingest::Roster;
use crate::ledger::{
    date_to_serial, serial_to_date, CellRef, CellValue, Font, LedgerReader, LedgerWriter,
};
use crate::models::BatchResult;

// ─── Outcome ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The ledger is already stamped with this market date.
    NoOp { stamped: NaiveDate },
    Apply(ReconciliationPlan),
}

/// Price and dividend text destined for one instrument's row.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteWrite {
    pub symbol:        String,
    pub sheet:         String,
    pub price_cell:    CellRef,
    pub price_text:    String,
    pub dividend_cell: CellRef,
    pub dividend_text: String,
}

/// A snapshot value copied into the history row when the plan is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Carry {
    pub label: &'static str,
    pub from:  CellRef,
    pub to:    CellRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub row:         u32,
    pub date_cell:   CellRef,
    /// Values read at apply time, in this order.
    pub carries:     Vec<Carry>,
    /// The percent-change formula is copied, not recomputed.
    pub change_from: CellRef,
    pub change_to:   CellRef,
    pub reset_cell:  CellRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPlan {
    pub sheet:          String,
    pub market_date:    NaiveDate,
    pub stamp_cell:     CellRef,
    pub date_format:    String,
    pub writes:         Vec<QuoteWrite>,
    pub history:        HistoryRow,
    pub next_row_cell:  CellRef,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

/// Date currently stamped on the primary sheet, if any.
pub fn stamped_date(
    ledger: &impl LedgerReader,
    sheet: &str,
    landmarks: &Landmarks,
) -> Result<Option<NaiveDate>, QuoteError> {
    let value = ledger.read_value(sheet, landmarks.timestamp_cell)?;
    if value.is_empty() {
        return Ok(None);
    }
    let date = value.as_number().and_then(serial_to_date);
    if date.is_none() {
        warn!(cell = %landmarks.timestamp_cell, value = ?value, "Date stamp is not a date — treating ledger as never updated");
    }
    Ok(date)
}

/// Decide whether `batch` still has to be written, and how.
pub fn reconcile(
    prior: Option<NaiveDate>,
    batch: &BatchResult,
    roster: &Roster,
    ledger: &impl LedgerReader,
    landmarks: &Landmarks,
) -> Result<Reconciliation, QuoteError> {
    if prior == Some(batch.market_date) {
        info!(stamped = %batch.market_date, "Not updating again today");
        return Ok(Reconciliation::NoOp { stamped: batch.market_date });
    }

    let instruments = roster.registry.instruments();
    if instruments.len() != batch.len() {
        return Err(QuoteError::PayloadFormat(format!(
            "batch has {} quotes for {} instruments",
            batch.len(),
            instruments.len()
        )));
    }

    let writes = instruments
        .iter()
        .zip(&batch.observations)
        .map(|(instrument, quote)| {
            if instrument.symbol != quote.symbol {
                return Err(QuoteError::SymbolMismatch {
                    expected: instrument.symbol.clone(),
                    found:    quote.symbol.clone(),
                });
            }
            Ok(QuoteWrite {
                symbol:        quote.symbol.clone(),
                sheet:         instrument.location.sheet.clone(),
                price_cell:    CellRef::new(landmarks.price_col, instrument.location.row),
                price_text:    quote.price_text.clone(),
                dividend_cell: CellRef::new(landmarks.dividend_col, instrument.location.row),
                dividend_text: quote.dividend_text.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sheet = roster.primary_sheet.clone();
    let last = roster.last_symbol_row;
    let next_row_cell = landmarks.next_row.resolve(last);
    let row = next_available_row(ledger, &sheet, next_row_cell)?;

    let history = HistoryRow {
        row,
        date_cell: CellRef::new(landmarks.history_date_col, row),
        carries: vec![
            Carry {
                label: "total value",
                from:  landmarks.total_value.resolve(last),
                to:    CellRef::new(landmarks.history_total_col, row),
            },
            Carry {
                label: "avg return incl. ESPP",
                from:  landmarks.avg_return_espp.resolve(last),
                to:    CellRef::new(landmarks.history_return_espp_col, row),
            },
            Carry {
                label: "avg return excl. ESPP",
                from:  landmarks.avg_return_no_espp.resolve(last),
                to:    CellRef::new(landmarks.history_return_no_espp_col, row),
            },
            Carry {
                label: "avg age",
                from:  landmarks.avg_age.resolve(last),
                to:    CellRef::new(landmarks.history_age_col, row),
            },
        ],
        change_from: CellRef::new(landmarks.history_change_col, row - 1),
        change_to:   CellRef::new(landmarks.history_change_col, row),
        reset_cell:  CellRef::new(landmarks.history_total_col, row),
    };

    debug!(
        prior = ?prior,
        market_date = %batch.market_date,
        history_row = row,
        "Reconciliation planned"
    );

    Ok(Reconciliation::Apply(ReconciliationPlan {
        sheet,
        market_date: batch.market_date,
        stamp_cell: landmarks.timestamp_cell,
        date_format: landmarks.date_format.clone(),
        writes,
        history,
        next_row_cell,
    }))
}

fn next_available_row(
    ledger: &impl LedgerReader,
    sheet: &str,
    cell: CellRef,
) -> Result<u32, QuoteError> {
    let value = ledger.read_value(sheet, cell)?;
    value
        .as_number()
        .filter(|n| n.fract() == 0.0 && *n >= 2.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
        .ok_or_else(|| {
            QuoteError::Layout(format!(
                "next available row cell {sheet}!{cell} holds {value:?}, expected a row number"
            ))
        })
}

// ─── Plan Application ─────────────────────────────────────────────────────────

impl ReconciliationPlan {
    /// Materialize the plan and advance the next-available-row counter.
    pub fn apply(&self, ledger: &mut impl LedgerWriter) -> Result<(), QuoteError> {
        let serial = CellValue::Number(date_to_serial(self.market_date));

        ledger.write_value(&self.sheet, self.stamp_cell, serial.clone())?;
        ledger.set_number_format(&self.sheet, self.stamp_cell, &self.date_format)?;

        for w in &self.writes {
            debug!(symbol = %w.symbol, sheet = %w.sheet, price = %w.price_text, dividend = %w.dividend_text, "Write quote");
            ledger.write_formula(&w.sheet, w.price_cell, &w.price_text)?;
            ledger.write_formula(&w.sheet, w.dividend_cell, &w.dividend_text)?;
        }
        info!(count = self.writes.len(), "Values updated");

        let h = &self.history;
        ledger.write_value(&self.sheet, h.date_cell, serial)?;
        ledger.set_number_format(&self.sheet, h.date_cell, &self.date_format)?;

        for carry in &h.carries {
            let value = ledger.read_value(&self.sheet, carry.from)?;
            debug!(label = carry.label, from = %carry.from, to = %carry.to, value = ?value, "Carry forward");
            ledger.write_value(&self.sheet, carry.to, value)?;
        }
        ledger.copy_cell(&self.sheet, h.change_from, h.change_to)?;
        ledger.set_font(&self.sheet, h.reset_cell, Font::neutral())?;
        info!(row = h.row, "Values placed in cumulative table");

        ledger.write_value(&self.sheet, self.next_row_cell, CellValue::Number((h.row + 1) as f64))?;
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
