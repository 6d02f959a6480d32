//! # engine::market_date
//!
//! **MarketDateResolver** — decides which trading day a quote batch is
//! "as of".
//!
//! The envelope's `created` field is a UTC timestamp (`YYYY-MM-DDTHH:mm:ssZ`).
//! It is shifted into the operator's zone and a weekend result is rolled back
//! to the preceding Friday.
//!
//! ## Known approximations
//! * The zone shift uses the local-vs-UTC offset sampled *now*, not the offset
//!   in force at the quote time.  DST never changes within a calendar day, so
//!   the date comes out right except around the DST switch weekends, where it
//!   can be off by the one hour the offset moved.
//! * Exchange holidays are not known; a holiday Friday stays a "trading day".

use chrono::{Datelike, Duration, FixedOffset, Local, NaiveDate, Weekday};
use serde_json::Value;

use crate::error::QuoteError;

const CREATED_KEY: &str = "created";

/// Offset of the local clock from UTC at this moment.
pub fn local_offset() -> FixedOffset {
    *Local::now().offset()
}

/// Market date of a decoded payload envelope.
pub fn resolve(document: &Value, offset: FixedOffset) -> Result<NaiveDate, QuoteError> {
    let created = find_created(document).ok_or_else(|| {
        QuoteError::PayloadFormat(format!("payload has no \"{CREATED_KEY}\" timestamp"))
    })?;
    from_timestamp(created, offset)
}

/// Market date for a `YYYY-MM-DDTHH...` UTC timestamp.  Minutes and seconds
/// are ignored.
pub fn from_timestamp(timestamp: &str, offset: FixedOffset) -> Result<NaiveDate, QuoteError> {
    let bad = || QuoteError::DateFormat(format!("cannot parse query time string: {timestamp}"));

    let field = |range: std::ops::Range<usize>| -> Result<u32, QuoteError> {
        timestamp
            .get(range)
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(bad)
    };

    let year = field(0..4)?;
    let month = field(5..7)?;
    let day = field(8..10)?;
    let hour = field(11..13)?;

    let utc = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .ok_or_else(bad)?;

    let local = utc + Duration::seconds(offset.local_minus_utc() as i64);
    Ok(roll_back_weekend(local.date()))
}

/// Saturday → Friday, Sunday → Friday, weekdays unchanged.
pub fn roll_back_weekend(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}

fn find_created(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => map
            .get(CREATED_KEY)
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(find_created)),
        Value::Array(items) => items.iter().find_map(find_created),
        _ => None,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
