//! # config — runtime configuration from environment variables
//!
//! | Variable            | Default             | Description                          |
//! |---------------------|---------------------|--------------------------------------|
//! | `LEDGER_PATH`       | `portfolio.json`    | Workbook document to reconcile       |
//! | `QUOTE_URL`         | YQL csv→json query  | Quote endpoint, `{symbols}` replaced |
//! | `HTTP_TIMEOUT_SECS` | `30`                | Quote request timeout                |
//! | `PAUSE_ON_EXIT`     | `true`              | Wait for Enter before exiting        |
//! | `MAX_SCAN_ROWS`     | `500`               | Rows scanned per sheet for `Cash`    |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::ledger::CellRef;

pub const SYMBOLS_PLACEHOLDER: &str = "{symbols}";

const DEFAULT_QUOTE_URL: &str = concat!(
    "https://query.yahooapis.com/v1/public/yql?q=select%20*%20from%20csv%20where%20url%3D",
    "'http%3A%2F%2Fdownload.finance.yahoo.com%2Fd%2Fquotes.csv%3Fs%3D{symbols}",
    "%26f%3Dsl1d%26e%3D.csv'%20and%20columns%3D'symbol%2Cprice%2Cdividend'",
    "&format=json&env=store%3A%2F%2Fdatatables.org%2Falltableswithkeys",
);

// ─── Landmarks ────────────────────────────────────────────────────────────────

/// A cell located relative to the last symbol row of the primary sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeCell {
    pub column:     u32,
    pub row_offset: u32,
}

impl RelativeCell {
    pub const fn new(column: u32, row_offset: u32) -> Self {
        Self { column, row_offset }
    }

    pub fn resolve(self, last_symbol_row: u32) -> CellRef {
        CellRef::new(self.column, last_symbol_row + self.row_offset)
    }
}

/// Every fixed coordinate of the portfolio workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    /// Index of the sheet carrying the date stamp and the history table.
    pub primary_sheet:    usize,
    pub symbol_col:       u32,
    pub price_col:        u32,
    pub dividend_col:     u32,
    pub first_symbol_row: u32,
    /// Symbol-column text that closes a sheet's list.
    pub terminator:       String,
    pub timestamp_cell:   CellRef,
    pub date_format:      String,

    // ── current snapshot, relative to the last symbol row ────────────────────
    pub next_row:           RelativeCell,
    pub total_value:        RelativeCell,
    pub avg_age:            RelativeCell,
    pub avg_return_espp:    RelativeCell,
    pub avg_return_no_espp: RelativeCell,

    // ── cumulative history columns ───────────────────────────────────────────
    pub history_date_col:           u32,
    pub history_total_col:          u32,
    pub history_change_col:         u32,
    pub history_return_espp_col:    u32,
    pub history_return_no_espp_col: u32,
    pub history_age_col:            u32,
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            primary_sheet:    0,
            symbol_col:       1,  // A
            price_col:        3,  // C
            dividend_col:     14, // N
            first_symbol_row: 5,
            terminator:       "Cash".to_string(),
            timestamp_cell:   CellRef::new(3, 1), // C1
            date_format:      "dd-mmm-yy".to_string(),

            next_row:           RelativeCell::new(3, 7),  // C
            total_value:        RelativeCell::new(4, 4),  // D
            avg_age:            RelativeCell::new(20, 4), // T
            avg_return_espp:    RelativeCell::new(24, 4), // X
            avg_return_no_espp: RelativeCell::new(25, 4), // Y

            history_date_col:           1,  // A
            history_total_col:          2,  // B
            history_change_col:         4,  // D
            history_return_espp_col:    12, // L
            history_return_no_espp_col: 13, // M
            history_age_col:            14, // N
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

const DEFAULT_PAUSE_ON_EXIT: bool = true;

#[derive(Debug, Clone)]
pub struct Config {
    pub ledger_path:   PathBuf,
    /// Quote endpoint with a `{symbols}` placeholder.
    pub quote_url:     String,
    pub http_timeout:  Duration,
    pub pause_on_exit: bool,
    pub max_scan_rows: u32,
    pub landmarks:     Landmarks,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let quote_url = env_or("QUOTE_URL", DEFAULT_QUOTE_URL);
        if !quote_url.contains(SYMBOLS_PLACEHOLDER) {
            bail!("QUOTE_URL must contain the {SYMBOLS_PLACEHOLDER} placeholder");
        }

        let timeout_secs: u64 = env_or("HTTP_TIMEOUT_SECS", "30")
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a number")?;

        let max_scan_rows: u32 = env_or("MAX_SCAN_ROWS", "500")
            .parse()
            .context("MAX_SCAN_ROWS must be a number")?;

        let pause_on_exit = parse_bool(&env_or("PAUSE_ON_EXIT", &DEFAULT_PAUSE_ON_EXIT.to_string()))
            .context("PAUSE_ON_EXIT must be true or false")?;

        Ok(Self {
            ledger_path:   PathBuf::from(env_or("LEDGER_PATH", "portfolio.json")),
            quote_url,
            http_timeout:  Duration::from_secs(timeout_secs),
            pause_on_exit,
            max_scan_rows,
            landmarks:     Landmarks::default(),
        })
    }
}

/// `PAUSE_ON_EXIT` when no [`Config`] could be built: the raw value if it
/// parses, the default otherwise.
pub fn pause_on_exit_or_default(value: Option<&str>) -> bool {
    value
        .and_then(|v| parse_bool(v).ok())
        .unwrap_or(DEFAULT_PAUSE_ON_EXIT)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: '{other}'"),
    }
}
