//! # engine::parser
//!
//! **QuotePayloadParser** — turns the raw quote payload into a
//! [`BatchResult`].
//!
//! The service answers with an envelope like
//!
//! ```text
//! {"query":{"count":2,"created":"2017-05-09T20:15:03Z","lang":"en-US",
//!   "results":{"row":[{"symbol":"AAA","price":"10.50","dividend":"0.40"},
//!                     {"symbol":"BBB","price":"20.00","dividend":"1.00"}]}}}
//! ```
//!
//! When a single symbol is requested `row` is an object instead of an array,
//! so records are not looked up by path: every object carrying a `symbol`
//! key is a record, taken depth-first in document order.
//!
//! Records must come back in request order.  Record `i` is checked against
//! `expected[i]` both by position and by its `symbol` key, and the first
//! disagreement aborts the whole batch.

use chrono::FixedOffset;
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::market_date;
use crate::error::QuoteError;
use crate::models::{BatchResult, QuoteObservation};

const SYMBOL_KEY: &str = "symbol";
const PRICE_KEY: &str = "price";
const DIVIDEND_KEY: &str = "dividend";

/// Parse `raw` into one observation per expected symbol.
///
/// `offset` is the operator's local-vs-UTC offset, see
/// [`market_date::local_offset`].
pub fn parse(raw: &str, expected: &[&str], offset: FixedOffset) -> Result<BatchResult, QuoteError> {
    let document = decode(raw)?;
    let market_date = market_date::resolve(&document, offset)?;

    let mut records = Vec::new();
    collect_records(&document, &mut records);

    if records.len() < expected.len() {
        let missing = expected[records.len()];
        return Err(QuoteError::PayloadFormat(format!(
            "payload has {} quote records, expected {} (first missing: {missing})",
            records.len(),
            expected.len()
        )));
    }
    if records.len() > expected.len() {
        return Err(QuoteError::PayloadFormat(format!(
            "payload has {} quote records, expected only {}",
            records.len(),
            expected.len()
        )));
    }

    let observations = expected
        .iter()
        .zip(records)
        .map(|(&symbol, record)| read_record(symbol, record))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchResult { market_date, observations })
}

/// Decode the payload envelope.
pub(crate) fn decode(raw: &str) -> Result<Value, QuoteError> {
    serde_json::from_str(raw.trim())
        .map_err(|e| QuoteError::PayloadFormat(format!("payload is not a JSON document: {e}")))
}

fn collect_records<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Object(map) if map.contains_key(SYMBOL_KEY) => out.push(map),
        Value::Object(map) => map.values().for_each(|v| collect_records(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_records(v, out)),
        _ => {}
    }
}

fn read_record(expected: &str, record: &Map<String, Value>) -> Result<QuoteObservation, QuoteError> {
    let found = field_text(record, SYMBOL_KEY)?.unwrap_or_default();
    if found != expected {
        return Err(QuoteError::SymbolMismatch {
            expected: expected.to_string(),
            found,
        });
    }

    let price = field_text(record, PRICE_KEY)?.ok_or_else(|| {
        QuoteError::PayloadFormat(format!("{PRICE_KEY} is null for {expected}"))
    })?;
    let dividend = field_text(record, DIVIDEND_KEY)?.unwrap_or_default();

    debug!(symbol = %expected, price = %price, dividend = %dividend, "Found info");
    Ok(QuoteObservation::new(expected, price, dividend))
}

/// Text of a required field, verbatim. `Ok(None)` means the key is present
/// but null.
fn field_text(record: &Map<String, Value>, key: &str) -> Result<Option<String>, QuoteError> {
    match record.get(key) {
        None => Err(QuoteError::PayloadFormat(format!("record is missing \"{key}\""))),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(QuoteError::PayloadFormat(format!(
            "\"{key}\" is not a scalar: {other}"
        ))),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn make_payload(rows: &str) -> String {
        format!(
            r#"{{"query":{{"count":2,"created":"2024-06-04T20:15:03Z","lang":"en-US","results":{{"row":{rows}}}}}}}"#
        )
    }

    #[test]
    fn test_two_records_in_order() {
        let payload = make_payload(
            r#"[{"symbol":"AAA","price":"10.50","dividend":"0.40"},{"symbol":"BBB","price":"20.00","dividend":"1.00"}]"#,
        );
        let batch = parse(&payload, &["AAA", "BBB"], utc()).unwrap();
        assert_eq!(batch.market_date, NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
        assert_eq!(
            batch.observations,
            vec![
                QuoteObservation::new("AAA", "10.50", "0.40"),
                QuoteObservation::new("BBB", "20.00", "1.00"),
            ]
        );
    }

    #[test]
    fn test_single_record_object_form() {
        let payload = make_payload(r#"{"symbol":"MSFT","price":"68.38","dividend":"1.56"}"#);
        let batch = parse(&payload, &["MSFT"], utc()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.observations[0].price_text, "68.38");
    }

    #[test]
    fn test_mismatch_names_both_symbols() {
        let payload = make_payload(
            r#"[{"symbol":"AAA","price":"1","dividend":"0"},{"symbol":"CCC","price":"2","dividend":"0"}]"#,
        );
        let err = parse(&payload, &["AAA", "BBB"], utc()).unwrap_err();
        match err {
            QuoteError::SymbolMismatch { expected, found } => {
                assert_eq!(expected, "BBB");
                assert_eq!(found, "CCC");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_padded_symbol_is_mismatch() {
        let payload = make_payload(r#"{"symbol":" AAA ","price":"1","dividend":"0"}"#);
        let err = parse(&payload, &["AAA"], utc()).unwrap_err();
        assert!(matches!(err, QuoteError::SymbolMismatch { ref found, .. } if found == " AAA "));
    }

    #[test]
    fn test_price_text_kept_verbatim() {
        let payload = make_payload(r#"{"symbol":"T","price":"38.50 ","dividend":" N/A"}"#);
        let batch = parse(&payload, &["T"], utc()).unwrap();
        assert_eq!(batch.observations[0], QuoteObservation::new("T", "38.50 ", " N/A"));
    }

    #[test]
    fn test_dividend_position_does_not_matter() {
        // dividend followed by another field, and dividend closing the record
        let payload = make_payload(
            r#"[{"symbol":"AAA","price":"10.50","dividend":"0.40","name":"Aaa"},{"symbol":"BBB","price":"20.00","dividend":"1.00"}]"#,
        );
        let batch = parse(&payload, &["AAA", "BBB"], utc()).unwrap();
        assert_eq!(batch.observations[0].dividend_text, "0.40");
        assert_eq!(batch.observations[1].dividend_text, "1.00");
    }

    #[test]
    fn test_elided_dividend_is_empty() {
        let payload = make_payload(
            r#"[{"symbol":"VFIAX","price":"221.05","dividend":""},{"symbol":"GLD","price":"117.10","dividend":null}]"#,
        );
        let batch = parse(&payload, &["VFIAX", "GLD"], utc()).unwrap();
        assert_eq!(batch.observations[0].dividend_text, "");
        assert_eq!(batch.observations[1].dividend_text, "");
    }

    #[test]
    fn test_numeric_values_become_text() {
        let payload = make_payload(r#"{"symbol":"T","price":38.5,"dividend":1.96}"#);
        let batch = parse(&payload, &["T"], utc()).unwrap();
        assert_eq!(batch.observations[0], QuoteObservation::new("T", "38.5", "1.96"));
    }

    #[test]
    fn test_missing_price_is_format_error() {
        let payload = make_payload(r#"{"symbol":"T","dividend":"1.96"}"#);
        let err = parse(&payload, &["T"], utc()).unwrap_err();
        assert!(matches!(err, QuoteError::PayloadFormat(_)));
    }

    #[test]
    fn test_missing_dividend_key_is_format_error() {
        let payload = make_payload(r#"{"symbol":"T","price":"38.50"}"#);
        let err = parse(&payload, &["T"], utc()).unwrap_err();
        assert!(matches!(err, QuoteError::PayloadFormat(_)));
    }

    #[test]
    fn test_too_few_records() {
        let payload = make_payload(r#"{"symbol":"AAA","price":"1","dividend":"0"}"#);
        let err = parse(&payload, &["AAA", "BBB"], utc()).unwrap_err();
        assert!(matches!(err, QuoteError::PayloadFormat(ref m) if m.contains("BBB")));
    }

    #[test]
    fn test_too_many_records() {
        let payload = make_payload(
            r#"[{"symbol":"AAA","price":"1","dividend":"0"},{"symbol":"BBB","price":"2","dividend":"0"}]"#,
        );
        let err = parse(&payload, &["AAA"], utc()).unwrap_err();
        assert!(matches!(err, QuoteError::PayloadFormat(_)));
    }

    #[test]
    fn test_not_json() {
        let err = parse("<html>503</html>", &["AAA"], utc()).unwrap_err();
        assert!(matches!(err, QuoteError::PayloadFormat(_)));
    }
}
