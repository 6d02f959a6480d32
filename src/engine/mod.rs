//! The quote pipeline's hard logic: payload parsing, market-date resolution
//! and once-per-day reconciliation.

pub mod market_date;
pub mod parser;
pub mod reconcile;
