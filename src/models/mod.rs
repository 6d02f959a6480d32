//! Domain models shared across the whole quote run.

pub mod instrument;
pub mod quote;

pub use instrument::{Classification, Instrument, LocationRef};
pub use quote::{BatchResult, QuoteObservation};
