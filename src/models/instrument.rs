//! # models::instrument
//!
//! Defines [`Instrument`], one tracked security of the watch-list, and the
//! naming heuristic that tells equities from mutual funds.

use serde::{Deserialize, Serialize};

/// Symbols ending in "X" that are *not* mutual funds.
const NOT_FUND_EXCEPTIONS: &[&str] = &["CVX", "FAX", "SBUX", "NFLX", "FCX"];

/// Funds whose ticker does not follow the trailing-"X" convention.
const EXTRA_FUNDS: &[&str] = &["JNK"];

/// How the quote provider treats a symbol.
///
/// Both kinds currently travel the same fetch and parse path; the provider
/// has split the two onto separate endpoints before, so the distinction is
/// kept on every instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    EquityLike,
    FundLike,
}

impl Classification {
    pub fn of(symbol: &str) -> Self {
        if EXTRA_FUNDS.contains(&symbol) {
            return Classification::FundLike;
        }
        if symbol.ends_with('X') && !NOT_FUND_EXCEPTIONS.contains(&symbol) {
            Classification::FundLike
        } else {
            Classification::EquityLike
        }
    }
}

/// Where an instrument lives in the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    pub sheet: String,
    pub row:   u32,
}

impl LocationRef {
    pub fn new(sheet: impl Into<String>, row: u32) -> Self {
        Self { sheet: sheet.into(), row }
    }
}

impl std::fmt::Display for LocationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}", self.sheet, self.row)
    }
}

/// A single tracked security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Cleaned, uppercase ticker, unique within the registry.
    pub symbol: String,
    pub classification: Classification,
    /// Fixed once discovered during ingestion.
    pub location: LocationRef,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, location: LocationRef) -> Self {
        let symbol = symbol.into();
        let classification = Classification::of(&symbol);
        Self { symbol, classification, location }
    }

    #[inline]
    pub fn is_fund(&self) -> bool {
        self.classification == Classification::FundLike
    }
}
