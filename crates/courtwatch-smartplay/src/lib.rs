//! HTTP data source for the LCSD SmartPlay tennis open-data feed.
//!
//! Implements [`courtwatch_core::source::DataSource`]: one GET per fetch, the
//! response envelope unwrapped and every row coerced into a
//! [`Record`](courtwatch_core::record::Record).

mod client;
mod payload;

pub mod error;

pub use client::{DEFAULT_URL, SmartPlaySource, SourceConfig};
pub use error::{Error, Result};
pub use payload::decode;
