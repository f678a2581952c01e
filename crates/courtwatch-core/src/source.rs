//! The `DataSource` trait.
//!
//! Implemented by fetch backends (e.g. `courtwatch-smartplay`). The cache and
//! monitor depend on this abstraction, never on a concrete transport.

use std::{future::Future, sync::Arc};

use crate::record::Record;

/// A no-argument, idempotent fetch of the full availability dataset.
///
/// Implementations coerce malformed fields to safe defaults (a count of `0`,
/// a missing dimension value) instead of failing the whole fetch; only
/// transport and envelope-level problems are errors.
pub trait DataSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch(&self) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;
}

impl<T: DataSource + ?Sized> DataSource for Arc<T> {
  type Error = T::Error;

  fn fetch(&self) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_ {
    (**self).fetch()
  }
}
