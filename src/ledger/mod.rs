//! # ledger
//!
//! The narrow capability interface to the tabular store (the portfolio
//! workbook).  Business logic only ever sees [`LedgerReader`] /
//! [`LedgerWriter`], so the reconciliation engine runs unchanged against the
//! file-backed [`Workbook`] or an in-memory one in tests.
//!
//! ## Addressing
//! Cells are addressed per sheet name with a 1-based [`CellRef`], shown in A1
//! notation (`C1`, `AA17`).

pub mod ingest;
pub mod workbook;

#[cfg(test)]
pub(crate) mod fixture;

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

pub use workbook::Workbook;

// ─── Cell Reference ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub column: u32,
    pub row:    u32,
}

impl CellRef {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

impl FromStr for CellRef {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || QuoteError::Ledger(format!("invalid cell address: {s:?}"));
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(bad)?;
        let (letters, digits) = s.split_at(split);
        let column = column_number(letters).ok_or_else(bad)?;
        let row: u32 = digits.parse().map_err(|_| bad())?;
        if row == 0 {
            return Err(bad());
        }
        Ok(Self { column, row })
    }
}

/// `1` → `A`, `26` → `Z`, `27` → `AA`.
pub fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Inverse of [`column_letters`]; `None` for empty or non-letter input.
pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        c.is_ascii_alphabetic()
            .then(|| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
    })
}

// ─── Cell Content ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontColor {
    #[default]
    Automatic,
    Indexed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Font {
    #[serde(default)]
    pub bold:  bool,
    #[serde(default)]
    pub color: FontColor,
}

impl Font {
    /// Regular weight, automatic color.
    pub fn neutral() -> Self {
        Self::default()
    }
}

// ─── Capabilities ─────────────────────────────────────────────────────────────

/// Read access to the tabular store.
pub trait LedgerReader {
    fn sheet_names(&self) -> Vec<String>;

    fn read_value(&self, sheet: &str, cell: CellRef) -> Result<CellValue, QuoteError>;

    fn read_formula(&self, sheet: &str, cell: CellRef) -> Result<Option<String>, QuoteError>;

    /// Name of the sheet at `index` in workbook order.
    fn sheet_at(&self, index: usize) -> Result<String, QuoteError> {
        self.sheet_names()
            .into_iter()
            .nth(index)
            .ok_or_else(|| QuoteError::Ledger(format!("workbook has no sheet #{}", index + 1)))
    }
}

/// Write access to the tabular store.
pub trait LedgerWriter: LedgerReader {
    /// Store formula text as entered by a user; numeric text becomes a number.
    fn write_formula(&mut self, sheet: &str, cell: CellRef, text: &str) -> Result<(), QuoteError>;

    fn write_value(&mut self, sheet: &str, cell: CellRef, value: CellValue) -> Result<(), QuoteError>;

    /// Copy content and format; relative row references follow the move.
    fn copy_cell(&mut self, sheet: &str, from: CellRef, to: CellRef) -> Result<(), QuoteError>;

    fn set_number_format(&mut self, sheet: &str, cell: CellRef, format: &str) -> Result<(), QuoteError>;

    fn set_font(&mut self, sheet: &str, cell: CellRef, font: Font) -> Result<(), QuoteError>;
}

// ─── Date Serials ─────────────────────────────────────────────────────────────

fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch date")
}

/// Spreadsheet serial day number of `date`.
pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date - serial_epoch()).num_days() as f64
}

/// Calendar day of a serial; the time-of-day fraction is dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > 3_000_000.0 {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

// ─── Formula Row Shifting ─────────────────────────────────────────────────────

/// Move every relative row reference in `formula` by `delta` rows.
///
/// `$`-anchored rows and text inside double quotes are left alone.
/// References that would land above row 1 are kept as they were.
pub fn shift_formula_rows(formula: &str, delta: i64) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;
    let mut in_string = false;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            in_string = !in_string;
            out.push(c);
            i += 1;
            continue;
        }
        let starts_ref = !in_string
            && (c == '$' || c.is_ascii_uppercase())
            && (i == 0 || !(chars[i - 1].is_ascii_alphanumeric() || chars[i - 1] == '_'));
        if !starts_ref {
            out.push(c);
            i += 1;
            continue;
        }

        match scan_reference(&chars, i) {
            Some(r) => {
                out.extend(&chars[i..r.digits_start]);
                let row: i64 = chars[r.digits_start..r.end].iter().collect::<String>().parse().unwrap_or(0);
                let shifted = row + delta;
                if r.absolute_row || shifted < 1 {
                    out.extend(&chars[r.digits_start..r.end]);
                } else {
                    out.push_str(&shifted.to_string());
                }
                i = r.end;
            }
            None => {
                // function names and the like: copy the whole word
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '$' || chars[i] == '_') {
                    out.push(chars[i]);
                    i += 1;
                }
            }
        }
    }
    out
}

struct ScannedRef {
    digits_start: usize,
    end:          usize,
    absolute_row: bool,
}

fn scan_reference(chars: &[char], start: usize) -> Option<ScannedRef> {
    let mut i = start;
    if chars.get(i) == Some(&'$') {
        i += 1;
    }
    let letters_start = i;
    while i < chars.len() && chars[i].is_ascii_uppercase() {
        i += 1;
    }
    let letters = i - letters_start;
    if letters == 0 || letters > 3 {
        return None;
    }
    let absolute_row = chars.get(i) == Some(&'$');
    if absolute_row {
        i += 1;
    }
    let digits_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    // `LOG10(` is a function, `A1B` is not a reference
    if chars.get(i).is_some_and(|c| c.is_ascii_alphanumeric() || *c == '(' || *c == '_') {
        return None;
    }
    Some(ScannedRef { digits_start, end: i, absolute_row })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
