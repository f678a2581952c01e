//! Error types for `courtwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The data source failed: network error, non-success status or a payload
  /// that could not be decoded. Never fatal; the next fetch retries.
  #[error("fetch failed: {0}")]
  Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn fetch<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Fetch(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
