//! # registry
//!
//! **SymbolRegistry** — the deduplicated, ordered watch-list.
//!
//! Raw symbol cells in the workbook carry noise: a broker name after the
//! ticker (`"MSFT Scottrade"`), broker footer rows, and a terminator row that
//! closes each list.  [`SymbolRegistry::register`] cleans one raw cell and
//! reports what happened to it.
//!
//! Once ingestion completes the registry is only ever handed out by shared
//! reference, so the parser and the reconciliation engine see a fixed list.

use tracing::debug;

use crate::models::{Instrument, LocationRef};

/// Footer rows that name a broker rather than a security.
const FOOTER_LABELS: &[&str] = &["Scottrade", "Shareowner Services"];

/// Separator of the batch lookup key sent to the quote service.
pub const SYMBOL_SEPARATOR: char = ',';

// ─── Registration Outcome ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// A new instrument was appended.
    Added(Instrument),
    /// The symbol is already tracked; the earlier location wins.
    Duplicate { symbol: String, kept: LocationRef },
    /// Blank cell or footer label.
    Skipped,
    /// The list terminator was reached.
    Terminator,
}

// ─── Registry ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    terminator:  String,
    instruments: Vec<Instrument>,
}

impl SymbolRegistry {
    pub fn new(terminator: impl Into<String>) -> Self {
        Self {
            terminator:  terminator.into(),
            instruments: Vec::new(),
        }
    }

    /// Clean `raw`, classify it, and append it unless it is a duplicate.
    ///
    /// The terminator is recognised after cleaning, so `"Cash Scottrade"`
    /// still closes the list.
    pub fn register(&mut self, raw: &str, location: LocationRef) -> Registration {
        let Some(ticker) = clean_symbol(raw) else {
            return Registration::Skipped;
        };
        if ticker == self.terminator {
            return Registration::Terminator;
        }

        let symbol = ticker.to_uppercase();
        if let Some(existing) = self.get(&symbol) {
            return Registration::Duplicate {
                symbol,
                kept: existing.location.clone(),
            };
        }

        let instrument = Instrument::new(symbol, location);
        debug!(
            symbol         = %instrument.symbol,
            classification = ?instrument.classification,
            location       = %instrument.location,
            "Instrument registered"
        );
        self.instruments.push(instrument.clone());
        Registration::Added(instrument)
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.symbol.as_str()).collect()
    }

    /// Batch lookup key: symbols in insertion order, no trailing separator.
    pub fn to_comma_joined_list(&self) -> String {
        self.symbols().join(&SYMBOL_SEPARATOR.to_string())
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// Strip the annotation after the first space and drop footer labels.
/// Case is left as written.
fn clean_symbol(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() || FOOTER_LABELS.contains(&raw) {
        return None;
    }
    raw.split(' ').next()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
