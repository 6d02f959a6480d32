//! # pipeline — one batch run
//!
//! ```text
//! load workbook → read watch-list → GET quotes → parse → reconcile → apply → save
//! ```
//!
//! Every stage either succeeds or aborts the run before the save, so the
//! workbook on disk is left untouched by a failed or redundant run.

use anyhow::Context;
use chrono::{FixedOffset, NaiveDate};
use tracing::info;

use crate::config::{Config, Landmarks};
use crate::engine::market_date::local_offset;
use crate::engine::parser;
use crate::engine::reconcile::{self, Reconciliation};
use crate::error::QuoteError;
use crate::fetch;
use crate::ledger::ingest::{read_roster, Roster};
use crate::ledger::{LedgerWriter, Workbook};
use crate::models::BatchResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Quotes written and a history row appended.
    Updated { market_date: NaiveDate, history_row: u32 },
    /// The ledger already held this market date; nothing written.
    AlreadyCurrent { market_date: NaiveDate },
}

/// Execute one full run against the configured workbook.
pub async fn run(config: &Config, client: &reqwest::Client) -> anyhow::Result<Outcome> {
    let mut workbook = Workbook::load(&config.ledger_path)
        .with_context(|| format!("Failed to open workbook {}", config.ledger_path.display()))?;

    let roster = read_roster(&workbook, &config.landmarks, config.max_scan_rows)
        .context("Failed to read symbols from workbook")?;

    let payload = fetch::fetch_payload(client, config, &roster.registry.to_comma_joined_list())
        .await
        .context("Failed to fetch quotes")?;

    let outcome = process_payload(&mut workbook, &roster, &payload, local_offset(), &config.landmarks)
        .context("Failed to reconcile quotes")?;

    if let Outcome::Updated { .. } = outcome {
        workbook
            .save(&config.ledger_path)
            .with_context(|| format!("Failed to save workbook {}", config.ledger_path.display()))?;
        info!(path = %config.ledger_path.display(), "Workbook saved");
    }
    Ok(outcome)
}

/// Parse `payload` and reconcile it into `ledger`.  No network involved.
pub fn process_payload(
    ledger: &mut impl LedgerWriter,
    roster: &Roster,
    payload: &str,
    offset: FixedOffset,
    landmarks: &Landmarks,
) -> Result<Outcome, QuoteError> {
    let batch = parser::parse(payload, &roster.registry.symbols(), offset)?;
    info!(market_date = %batch.market_date, quotes = batch.len(), "Payload parsed");
    log_quote_table(roster, &batch);

    let prior = reconcile::stamped_date(&*ledger, &roster.primary_sheet, landmarks)?;
    match reconcile::reconcile(prior, &batch, roster, &*ledger, landmarks)? {
        Reconciliation::NoOp { stamped } => Ok(Outcome::AlreadyCurrent { market_date: stamped }),
        Reconciliation::Apply(plan) => {
            plan.apply(ledger)?;
            Ok(Outcome::Updated {
                market_date: plan.market_date,
                history_row: plan.history.row,
            })
        }
    }
}

fn log_quote_table(roster: &Roster, batch: &BatchResult) {
    for (instrument, quote) in roster.registry.instruments().iter().zip(&batch.observations) {
        info!(
            symbol   = %instrument.symbol,
            sheet    = %instrument.location.sheet,
            row      = instrument.location.row,
            fund     = instrument.is_fund(),
            price    = %quote.price_text,
            dividend = %quote.dividend_text,
            "Quote"
        );
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::fixture::{cell, payload, portfolio_workbook};
    use crate::ledger::{CellValue, LedgerReader};

    const ROWS: &str = r#"[{"symbol":"MSFT","price":"68.38","dividend":"1.56"},{"symbol":"T","price":"38.50","dividend":"1.96"},{"symbol":"VFIAX","price":"221.05","dividend":""}]"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pacific() -> FixedOffset {
        FixedOffset::west_opt(7 * 3600).unwrap()
    }

    fn make_roster(wb: &Workbook) -> Roster {
        read_roster(wb, &Landmarks::default(), 100).unwrap()
    }

    #[test]
    fn test_saturday_query_updates_as_friday() {
        let mut wb = portfolio_workbook(date(2024, 6, 6));
        let roster = make_roster(&wb);
        let raw = payload("2024-06-08T18:00:00Z", ROWS);

        let outcome = process_payload(&mut wb, &roster, &raw, pacific(), &Landmarks::default()).unwrap();
        assert_eq!(outcome, Outcome::Updated { market_date: date(2024, 6, 7), history_row: 20 });
        assert_eq!(wb.read_value("Sheet1", cell("C5")).unwrap(), CellValue::Number(68.38));
    }

    #[test]
    fn test_rerun_same_day_writes_nothing() {
        let mut wb = portfolio_workbook(date(2024, 5, 31));
        let roster = make_roster(&wb);
        let raw = payload("2024-06-03T21:00:00Z", ROWS);

        process_payload(&mut wb, &roster, &raw, pacific(), &Landmarks::default()).unwrap();
        let after_first = wb.clone();
        let outcome = process_payload(&mut wb, &roster, &raw, pacific(), &Landmarks::default()).unwrap();

        assert_eq!(outcome, Outcome::AlreadyCurrent { market_date: date(2024, 6, 3) });
        assert_eq!(wb, after_first);
    }

    #[test]
    fn test_mismatch_leaves_workbook_untouched() {
        let mut wb = portfolio_workbook(date(2024, 5, 31));
        let before = wb.clone();
        let roster = make_roster(&wb);
        let rows = ROWS.replace("\"T\"", "\"TT\"");
        let raw = payload("2024-06-03T21:00:00Z", &rows);

        let err = process_payload(&mut wb, &roster, &raw, pacific(), &Landmarks::default()).unwrap_err();
        assert!(matches!(err, QuoteError::SymbolMismatch { ref expected, ref found } if expected == "T" && found == "TT"));
        assert_eq!(wb, before);
    }

    #[test]
    fn test_bad_timestamp_aborts() {
        let mut wb = portfolio_workbook(date(2024, 5, 31));
        let roster = make_roster(&wb);
        let raw = payload("yesterday", ROWS);
        let err = process_payload(&mut wb, &roster, &raw, pacific(), &Landmarks::default()).unwrap_err();
        assert!(matches!(err, QuoteError::DateFormat(_)));
    }
}
