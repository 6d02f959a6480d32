//! # error
//!
//! Centralised error type for one reconciliation run.
//!
//! Every stage returns `Result<_, QuoteError>`.  All variants are fatal: the
//! run aborts before the workbook is saved, so nothing is ever half-applied.
//! An already-current ledger is *not* an error, see
//! [`Reconciliation::NoOp`](crate::engine::reconcile::Reconciliation).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    /// The quote request failed, timed out, or came back empty.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A required field or record is missing from the payload.
    #[error("Payload format error: {0}")]
    PayloadFormat(String),

    /// The n-th quoted symbol is not the n-th requested symbol.
    #[error("Expecting: {expected} but found: {found}")]
    SymbolMismatch { expected: String, found: String },

    /// The `created` timestamp does not decode to a calendar date.
    #[error("Date format error: {0}")]
    DateFormat(String),

    /// Reading or writing the workbook failed.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// The workbook does not have the shape the landmarks describe.
    #[error("Layout error: {0}")]
    Layout(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::Transport(err.to_string())
    }
}
