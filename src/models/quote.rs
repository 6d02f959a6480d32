//! # models::quote
//!
//! Output of one parse run: a market date plus one [`QuoteObservation`] per
//! instrument, in watch-list order.
//!
//! Prices and dividends stay as text.  They are written back verbatim into
//! formula cells, so any float round-trip would only lose digits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteObservation {
    pub symbol:        String,
    pub price_text:    String,
    /// Empty when the provider elided the field.
    pub dividend_text: String,
}

impl QuoteObservation {
    pub fn new(
        symbol: impl Into<String>,
        price_text: impl Into<String>,
        dividend_text: impl Into<String>,
    ) -> Self {
        Self {
            symbol:        symbol.into(),
            price_text:    price_text.into(),
            dividend_text: dividend_text.into(),
        }
    }
}

/// Every observation in a batch is quoted "as of" the same `market_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub market_date:  NaiveDate,
    pub observations: Vec<QuoteObservation>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.observations.len()
    }
}
